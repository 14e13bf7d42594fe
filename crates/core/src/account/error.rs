//! Account directory errors.

use tally_shared::AppError;
use tally_shared::types::AccountId;
use thiserror::Error;

use super::types::AccountType;
use crate::error::ErrorKind;

/// Errors that can occur while maintaining the chart of accounts.
#[derive(Debug, Error)]
pub enum AccountError {
    // ========== Validation Errors ==========
    /// Account code is empty or too long.
    #[error("Invalid account code: {0:?}")]
    InvalidCode(String),

    /// Account name is empty.
    #[error("Account name cannot be empty")]
    EmptyName,

    /// Unknown account type string.
    #[error("Invalid account type: {0}")]
    InvalidAccountType(String),

    /// Unknown account role in the code registry.
    #[error("Unknown account role: {0}")]
    UnknownRole(String),

    /// Parent account has a different type.
    #[error("Parent account type {parent} does not match account type {child}")]
    ParentTypeMismatch {
        /// Parent's type.
        parent: AccountType,
        /// Child's type.
        child: AccountType,
    },

    /// Parent assignment would create a cycle.
    #[error("Account {0} cannot be its own ancestor")]
    ParentCycle(AccountId),

    // ========== Conflict Errors ==========
    /// Another account already uses this code.
    #[error("Account code already exists: {0}")]
    DuplicateCode(String),

    /// System account codes are immutable.
    #[error("Cannot change the code of system account {0}")]
    SystemCodeImmutable(String),

    /// System accounts cannot be deleted.
    #[error("Cannot delete system account {0}")]
    SystemAccountDelete(String),

    /// Account still has journal lines.
    #[error("Cannot delete account {0}: it has journal lines")]
    HasJournalLines(String),

    /// Account still has child accounts.
    #[error("Cannot delete account {0}: it has child accounts")]
    HasChildren(String),

    // ========== Not Found Errors ==========
    /// Account not found by id.
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    /// Account not found by code.
    #[error("Account not found for code: {0}")]
    CodeNotFound(String),

    /// Parent account not found.
    #[error("Parent account not found: {0}")]
    ParentNotFound(AccountId),

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl AccountError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCode(_) => "INVALID_ACCOUNT_CODE",
            Self::EmptyName => "EMPTY_ACCOUNT_NAME",
            Self::InvalidAccountType(_) => "INVALID_ACCOUNT_TYPE",
            Self::UnknownRole(_) => "UNKNOWN_ACCOUNT_ROLE",
            Self::ParentTypeMismatch { .. } => "PARENT_TYPE_MISMATCH",
            Self::ParentCycle(_) => "PARENT_CYCLE",
            Self::DuplicateCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::SystemCodeImmutable(_) => "SYSTEM_CODE_IMMUTABLE",
            Self::SystemAccountDelete(_) => "SYSTEM_ACCOUNT_DELETE",
            Self::HasJournalLines(_) => "ACCOUNT_HAS_JOURNAL_LINES",
            Self::HasChildren(_) => "ACCOUNT_HAS_CHILDREN",
            Self::NotFound(_) | Self::CodeNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::ParentNotFound(_) => "PARENT_ACCOUNT_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the error class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCode(_)
            | Self::EmptyName
            | Self::InvalidAccountType(_)
            | Self::UnknownRole(_)
            | Self::ParentTypeMismatch { .. }
            | Self::ParentCycle(_) => ErrorKind::Validation,
            Self::DuplicateCode(_)
            | Self::SystemCodeImmutable(_)
            | Self::SystemAccountDelete(_)
            | Self::HasJournalLines(_)
            | Self::HasChildren(_) => ErrorKind::Conflict,
            Self::NotFound(_) | Self::CodeNotFound(_) | Self::ParentNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Database(_) => ErrorKind::Internal,
        }
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Database(msg) => Self::Database(msg),
            other => other.kind().into_app_error(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AccountError::DuplicateCode("1000".into()).error_code(),
            "DUPLICATE_ACCOUNT_CODE"
        );
        assert_eq!(
            AccountError::NotFound(AccountId::new()).error_code(),
            "ACCOUNT_NOT_FOUND"
        );
        assert_eq!(
            AccountError::CodeNotFound("9999".into()).error_code(),
            "ACCOUNT_NOT_FOUND"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            AccountError::ParentTypeMismatch {
                parent: AccountType::Asset,
                child: AccountType::Expense,
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            AccountError::SystemAccountDelete("1000".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AccountError::ParentNotFound(AccountId::new()).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = AccountError::HasChildren("1000".into()).into();
        assert_eq!(app.status_code(), 409);

        let app: AppError = AccountError::Database("gone".into()).into();
        assert!(matches!(app, AppError::Database(msg) if msg == "gone"));
    }

    #[test]
    fn test_error_display() {
        let err = AccountError::ParentTypeMismatch {
            parent: AccountType::Asset,
            child: AccountType::Revenue,
        };
        assert_eq!(
            err.to_string(),
            "Parent account type ASSET does not match account type REVENUE"
        );
    }
}
