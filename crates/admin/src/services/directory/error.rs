//! Directory service error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Expected failures of directory operations, plus storage failures.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    #[error("User not found")]
    NotFound,

    /// Email (or external id) already belongs to another account.
    #[error("{0}")]
    Conflict(String),

    /// The acting admin tried to delete their own account.
    #[error("Cannot delete your own account")]
    SelfDelete,

    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for DirectoryError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Repository(other),
        }
    }
}
