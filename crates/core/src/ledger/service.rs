//! Journal state machine and entry-level rules.
//!
//! ```text
//! DRAFT ──post──▶ POSTED ──reverse──▶ REVERSED
//!   │
//!   └──delete──▶ (gone)
//! ```
//!
//! The persistence layer re-runs these checks inside the transaction that
//! performs the write.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tally_shared::types::AccountId;
use uuid::Uuid;

use super::error::LedgerError;
use super::types::{CreateJournalEntryData, EntryStatus, EntryTotals, JournalEntry, JournalLineInput};
use super::validation::validate_lines;
use crate::fiscal::FiscalPeriod;

/// Prefix of every entry number.
pub const ENTRY_NUMBER_PREFIX: &str = "JE";

/// Stateless service for journal entry rules.
pub struct LedgerService;

impl LedgerService {
    /// Validates entry data before any lookup happens.
    ///
    /// # Errors
    ///
    /// Returns the first line rule violated, or `EmptyDescription`.
    pub fn validate_new_entry(data: &CreateJournalEntryData) -> Result<EntryTotals, LedgerError> {
        let totals = validate_lines(&data.lines)?;
        if data.description.trim().is_empty() {
            return Err(LedgerError::EmptyDescription);
        }
        Ok(totals)
    }

    /// Distinct account ids referenced by a line set, in id order.
    #[must_use]
    pub fn referenced_accounts(lines: &[JournalLineInput]) -> Vec<AccountId> {
        lines
            .iter()
            .map(|l| l.account_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Compares requested account ids with the ids that exist.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccounts` listing every missing id.
    pub fn check_accounts_exist(
        requested: &[AccountId],
        existing: &BTreeSet<AccountId>,
    ) -> Result<(), LedgerError> {
        let missing: Vec<AccountId> = requested
            .iter()
            .filter(|id| !existing.contains(id))
            .copied()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::UnknownAccounts(missing))
        }
    }

    /// Validates the DRAFT -> POSTED transition.
    ///
    /// # Errors
    ///
    /// Returns a conflict if the entry is not a draft or its period is closed.
    pub fn ensure_can_post(
        entry: &JournalEntry,
        period: Option<&FiscalPeriod>,
    ) -> Result<(), LedgerError> {
        match entry.status {
            EntryStatus::Draft => {}
            EntryStatus::Posted => return Err(LedgerError::AlreadyPosted(entry.entry_number.clone())),
            EntryStatus::Reversed => {
                return Err(LedgerError::CannotPostReversed(entry.entry_number.clone()));
            }
        }
        if let Some(period) = period
            && !period.is_open()
        {
            return Err(LedgerError::PeriodClosed(period.name.clone()));
        }
        Ok(())
    }

    /// Validates the POSTED -> REVERSED transition.
    ///
    /// # Errors
    ///
    /// Returns `NotPosted` unless the entry is POSTED.
    pub fn ensure_can_reverse(entry: &JournalEntry) -> Result<(), LedgerError> {
        if entry.status != EntryStatus::Posted {
            return Err(LedgerError::NotPosted {
                entry_number: entry.entry_number.clone(),
                status: entry.status,
            });
        }
        Ok(())
    }

    /// Validates deletion.
    ///
    /// # Errors
    ///
    /// Returns `CanOnlyDeleteDraft` unless the entry is a DRAFT.
    pub fn ensure_can_delete(entry: &JournalEntry) -> Result<(), LedgerError> {
        if entry.status != EntryStatus::Draft {
            return Err(LedgerError::CanOnlyDeleteDraft {
                entry_number: entry.entry_number.clone(),
                status: entry.status,
            });
        }
        Ok(())
    }

    /// Generates an entry number `JE-YYYYMMDD-XXXXXXXX`.
    ///
    /// The suffix is 8 uppercase hex characters of a random v4 UUID; uniqueness
    /// is enforced by the storage index.
    #[must_use]
    pub fn generate_entry_number(date: NaiveDate) -> String {
        let random = Uuid::new_v4().simple().to_string();
        format!(
            "{ENTRY_NUMBER_PREFIX}-{}-{}",
            date.format("%Y%m%d"),
            random[..8].to_ascii_uppercase()
        )
    }
}
