//! # Persistence Errors

use thiserror::Error;

use crate::storage::StorageError;
use crate::BoxError;

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Persistence adapter errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Migrated document at position {position} has no identifier in '{field}'")]
    MissingId { position: usize, field: String },

    #[error("Embedded values do not correspond to base documents: {0}")]
    Correspondence(String),

    #[error("Adapter failed: {0}")]
    Adapter(#[source] BoxError),
}

impl PersistenceError {
    pub fn correspondence(reason: impl Into<String>) -> Self {
        Self::Correspondence(reason.into())
    }

    /// Get a stable error code
    pub fn code(&self) -> &'static str {
        match self {
            PersistenceError::Storage(err) => err.code(),
            PersistenceError::MissingId { .. } => "MISSING_ID",
            PersistenceError::Correspondence(_) => "CORRESPONDENCE_ERROR",
            PersistenceError::Adapter(_) => "ADAPTER_ERROR",
        }
    }
}
