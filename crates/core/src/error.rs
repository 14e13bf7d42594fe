//! Error classification shared by all ledger components.

use serde::{Deserialize, Serialize};

/// Broad class of a component error.
///
/// None of the classes is retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The input is wrong and must be corrected before retrying.
    Validation,
    /// The operation is not allowed in the current state.
    Conflict,
    /// The referenced entity does not exist.
    NotFound,
    /// Persistence or other infrastructure failure.
    Internal,
}

impl ErrorKind {
    /// Wraps a message into the matching [`tally_shared::AppError`] class.
    #[must_use]
    pub fn into_app_error(self, message: String) -> tally_shared::AppError {
        use tally_shared::AppError;

        match self {
            Self::Validation => AppError::Validation(message),
            Self::Conflict => AppError::Conflict(message),
            Self::NotFound => AppError::NotFound(message),
            Self::Internal => AppError::Internal(message),
        }
    }
}
