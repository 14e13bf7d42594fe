//! Auto-entry engine errors.

use tally_shared::AppError;
use thiserror::Error;
use uuid::Uuid;

use crate::account::{AccountError, AccountRole};
use crate::error::ErrorKind;
use crate::ledger::{LedgerError, ReferenceType, SourceRule};

/// Errors that can occur while deriving or recording an automatic entry.
#[derive(Debug, Error)]
pub enum AutoEntryError {
    /// A required system account is missing.
    #[error("Accounting not initialized: missing {role} account (code {code})")]
    AccountingNotInitialized {
        /// Role of the missing account.
        role: AccountRole,
        /// Code the registry expects.
        code: String,
    },

    /// Event data is unusable (negative or zero amount, bad method).
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// The same rule already recorded an entry for this reference.
    #[error("Duplicate event: {rule} already recorded for {reference_type} {reference_id}")]
    DuplicateEvent {
        /// Rule that was invoked twice.
        rule: SourceRule,
        /// Reference kind.
        reference_type: ReferenceType,
        /// Upstream id.
        reference_id: Uuid,
    },

    /// The journal ledger rejected the entry.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Account registry or lookup failure.
    #[error(transparent)]
    Account(#[from] AccountError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl AutoEntryError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccountingNotInitialized { .. } => "ACCOUNTING_NOT_INITIALIZED",
            Self::InvalidEvent(_) => "INVALID_EVENT",
            Self::DuplicateEvent { .. } => "DUPLICATE_EVENT",
            Self::Ledger(err) => err.error_code(),
            Self::Account(err) => err.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the error class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountingNotInitialized { .. } | Self::InvalidEvent(_) => ErrorKind::Validation,
            Self::DuplicateEvent { .. } => ErrorKind::Conflict,
            Self::Ledger(err) => err.kind(),
            Self::Account(err) => err.kind(),
            Self::Database(_) => ErrorKind::Internal,
        }
    }
}

impl From<AutoEntryError> for AppError {
    fn from(err: AutoEntryError) -> Self {
        match err {
            AutoEntryError::Database(msg) => Self::Database(msg),
            AutoEntryError::Ledger(inner) => inner.into(),
            AutoEntryError::Account(inner) => inner.into(),
            other => other.kind().into_app_error(other.to_string()),
        }
    }
}
