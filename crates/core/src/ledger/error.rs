//! Ledger error types for validation and state errors.
//!
//! This module defines all errors that can occur during journal operations:
//! line set validation, account and period resolution, and state machine
//! transitions.

use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::{AccountId, JournalEntryId};
use thiserror::Error;
use uuid::Uuid;

use super::types::{EntryStatus, ReferenceType, SourceRule};
use crate::error::ErrorKind;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry must have at least 2 lines.
    #[error("Journal entry must have at least 2 lines")]
    InsufficientLines,

    /// Entry does not balance (debits != credits within tolerance).
    #[error("Journal entry does not balance. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Line amount cannot be negative.
    #[error("Line {line} has a negative amount")]
    NegativeAmount {
        /// 1-based line position.
        line: usize,
    },

    /// Line must have exactly one of debit or credit set.
    #[error("Line {line} must have exactly one side (debit or credit)")]
    InvalidLineSides {
        /// 1-based line position.
        line: usize,
    },

    /// Description is empty.
    #[error("Journal entry description cannot be empty")]
    EmptyDescription,

    /// Lines reference accounts that do not exist.
    #[error("Unknown account(s): {}", join_ids(.0))]
    UnknownAccounts(Vec<AccountId>),

    /// Unknown status string.
    #[error("Invalid journal entry status: {0}")]
    InvalidStatus(String),

    /// Unknown or incomplete reference.
    #[error("Invalid reference type: {0}")]
    InvalidReferenceType(String),

    /// Unknown auto-entry rule tag.
    #[error("Invalid source rule: {0}")]
    InvalidSourceRule(String),

    // ========== State Errors ==========
    /// Entry is already posted.
    #[error("Journal entry {0} is already posted")]
    AlreadyPosted(String),

    /// Reversed entries cannot be posted.
    #[error("Cannot post reversed journal entry {0}")]
    CannotPostReversed(String),

    /// The entry's fiscal period is closed.
    #[error("Fiscal period '{0}' is closed")]
    PeriodClosed(String),

    /// Only posted entries can be reversed.
    #[error("Cannot reverse journal entry {entry_number}: status is {status}")]
    NotPosted {
        /// Entry number.
        entry_number: String,
        /// Current status.
        status: EntryStatus,
    },

    /// Only drafts can be deleted.
    #[error("Can only delete draft journal entries; {entry_number} is {status}")]
    CanOnlyDeleteDraft {
        /// Entry number.
        entry_number: String,
        /// Current status.
        status: EntryStatus,
    },

    /// An entry already exists for this rule and business reference.
    #[error("Entry for {rule} on {reference_type} {reference_id} already exists")]
    DuplicateSource {
        /// Generating rule.
        rule: SourceRule,
        /// Reference kind.
        reference_type: ReferenceType,
        /// Referenced business id.
        reference_id: Uuid,
    },

    /// A concurrent transition changed the entry first.
    #[error("Journal entry {0} was modified concurrently")]
    ConcurrentModification(String),

    /// Every generated entry number was already taken.
    #[error("Entry number {0} is already taken")]
    EntryNumberTaken(String),

    // ========== Not Found Errors ==========
    /// Entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_ids(ids: &[AccountId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::Unbalanced { .. } => "ENTRY_NOT_BALANCED",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::InvalidLineSides { .. } => "INVALID_LINE_SIDES",
            Self::EmptyDescription => "EMPTY_DESCRIPTION",
            Self::UnknownAccounts(_) => "UNKNOWN_ACCOUNT",
            Self::InvalidStatus(_) => "INVALID_STATUS",
            Self::InvalidReferenceType(_) => "INVALID_REFERENCE_TYPE",
            Self::InvalidSourceRule(_) => "INVALID_SOURCE_RULE",
            Self::AlreadyPosted(_) => "ALREADY_POSTED",
            Self::CannotPostReversed(_) => "CANNOT_POST_REVERSED",
            Self::PeriodClosed(_) => "PERIOD_CLOSED",
            Self::NotPosted { .. } => "NOT_POSTED",
            Self::CanOnlyDeleteDraft { .. } => "CAN_ONLY_DELETE_DRAFT",
            Self::DuplicateSource { .. } => "DUPLICATE_SOURCE_ENTRY",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::EntryNumberTaken(_) => "ENTRY_NUMBER_TAKEN",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the error class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientLines
            | Self::Unbalanced { .. }
            | Self::NegativeAmount { .. }
            | Self::InvalidLineSides { .. }
            | Self::EmptyDescription
            | Self::UnknownAccounts(_)
            | Self::InvalidStatus(_)
            | Self::InvalidReferenceType(_)
            | Self::InvalidSourceRule(_) => ErrorKind::Validation,

            Self::AlreadyPosted(_)
            | Self::CannotPostReversed(_)
            | Self::PeriodClosed(_)
            | Self::NotPosted { .. }
            | Self::CanOnlyDeleteDraft { .. }
            | Self::DuplicateSource { .. }
            | Self::ConcurrentModification(_)
            | Self::EntryNumberTaken(_) => ErrorKind::Conflict,

            Self::EntryNotFound(_) | Self::AccountNotFound(_) => ErrorKind::NotFound,

            Self::Database(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Database(msg) => Self::Database(msg),
            other => other.kind().into_app_error(other.to_string()),
        }
    }
}
