//! Mirrored reversal entries.
//!
//! A posted entry is never edited. It is cancelled by a new entry with every
//! line's debit and credit swapped, which is posted in the same unit of work
//! that marks the original REVERSED.

use chrono::NaiveDate;
use tally_shared::types::UserId;

use super::types::{CreateJournalEntryData, JournalEntry, JournalLineInput};

/// Stateless service for building reversal entries.
pub struct ReversalService;

impl ReversalService {
    /// Builds the reversing entry data for a posted entry.
    ///
    /// For each original line:
    /// - Debits become credits and credits become debits
    /// - Memo becomes `Reversal of {entry_number}[: original memo]`
    ///
    /// The reference is kept, the source rule is dropped so the reversal never
    /// collides with the auto-entry idempotency key.
    #[must_use]
    pub fn build_reversal(
        original: &JournalEntry,
        date: NaiveDate,
        user_id: Option<UserId>,
    ) -> CreateJournalEntryData {
        let lines = original
            .lines
            .iter()
            .map(|line| JournalLineInput {
                account_id: line.account_id,
                debit: line.credit,
                credit: line.debit,
                memo: Some(Self::reversal_memo(&original.entry_number, line.memo.as_deref())),
            })
            .collect();

        CreateJournalEntryData {
            date,
            description: format!(
                "Reversal of {}: {}",
                original.entry_number, original.description
            ),
            reference: original.reference,
            lines,
            user_id,
            source_rule: None,
        }
    }

    fn reversal_memo(entry_number: &str, memo: Option<&str>) -> String {
        match memo {
            Some(memo) if !memo.is_empty() => format!("Reversal of {entry_number}: {memo}"),
            _ => format!("Reversal of {entry_number}"),
        }
    }
}
