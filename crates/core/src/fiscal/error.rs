//! Fiscal calendar errors.

use chrono::NaiveDate;
use tally_shared::AppError;
use tally_shared::types::FiscalPeriodId;
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur while maintaining fiscal periods.
#[derive(Debug, Error)]
pub enum FiscalError {
    /// End date is not after the start date.
    #[error("Invalid period dates: end {end} must be after start {start}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Period name is empty.
    #[error("Fiscal period name cannot be empty")]
    EmptyName,

    /// Unknown status string.
    #[error("Invalid fiscal period status: {0}")]
    InvalidStatus(String),

    /// Date range intersects an existing period.
    #[error("Fiscal period overlaps existing period '{0}'")]
    Overlap(String),

    /// Closed periods cannot be edited.
    #[error("Fiscal period '{0}' is closed and cannot be updated")]
    PeriodClosed(String),

    /// Period still has draft entries.
    #[error("Cannot close fiscal period '{name}': {draft_count} draft entries remain")]
    HasDraftEntries {
        /// Period name.
        name: String,
        /// Number of drafts.
        draft_count: u64,
    },

    /// Period is already closed.
    #[error("Fiscal period '{0}' is already closed")]
    AlreadyClosed(String),

    /// Period is already open.
    #[error("Fiscal period '{0}' is already open")]
    AlreadyOpen(String),

    /// Period not found.
    #[error("Fiscal period not found: {0}")]
    NotFound(FiscalPeriodId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl FiscalError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_PERIOD_DATES",
            Self::EmptyName => "EMPTY_PERIOD_NAME",
            Self::InvalidStatus(_) => "INVALID_PERIOD_STATUS",
            Self::Overlap(_) => "PERIOD_OVERLAP",
            Self::PeriodClosed(_) => "PERIOD_CLOSED",
            Self::HasDraftEntries { .. } => "PERIOD_HAS_DRAFT_ENTRIES",
            Self::AlreadyClosed(_) => "PERIOD_ALREADY_CLOSED",
            Self::AlreadyOpen(_) => "PERIOD_ALREADY_OPEN",
            Self::NotFound(_) => "PERIOD_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the error class.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidDateRange { .. } | Self::EmptyName | Self::InvalidStatus(_) => {
                ErrorKind::Validation
            }
            Self::Overlap(_)
            | Self::PeriodClosed(_)
            | Self::HasDraftEntries { .. }
            | Self::AlreadyClosed(_)
            | Self::AlreadyOpen(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Database(_) => ErrorKind::Internal,
        }
    }
}

impl From<FiscalError> for AppError {
    fn from(err: FiscalError) -> Self {
        match err {
            FiscalError::Database(msg) => Self::Database(msg),
            other => other.kind().into_app_error(other.to_string()),
        }
    }
}
