//! Migration error types
//!
//! Every failure aborts the whole call. Nothing is retried and no partial
//! result is returned.

use thiserror::Error;

use crate::persistence::PersistenceError;
use crate::BoxError;

/// Result type for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Migration errors
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A revision declares zero or both updater kinds, or the config is unusable
    #[error("Configuration error{}: {reason}", revision_suffix(.revision))]
    Configuration {
        revision: Option<usize>,
        reason: String,
    },

    /// A document does not carry the version the engine expected
    #[error("Version mismatch at position {position}{}: expected {expected}, found {found}", level_suffix(.level))]
    VersionMismatch {
        /// Level whose output was checked, `None` for the final completion check
        level: Option<usize>,
        position: usize,
        expected: u64,
        found: String,
    },

    /// A batch updater returned a different number of documents than it received
    #[error("Batch updater at level {level} returned {actual} documents for {expected} inputs")]
    Cardinality {
        level: usize,
        expected: usize,
        actual: usize,
    },

    /// An updater failed
    #[error("Updater at level {level} failed: {source}")]
    Updater {
        level: usize,
        #[source]
        source: BoxError,
    },

    /// The persistence adapter failed
    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    /// A document cannot be versioned at all
    #[error("Invalid document at position {position}: {reason}")]
    InvalidDocument { position: usize, reason: String },
}

fn revision_suffix(revision: &Option<usize>) -> String {
    revision
        .map(|index| format!(" in revision {}", index))
        .unwrap_or_default()
}

fn level_suffix(level: &Option<usize>) -> String {
    level
        .map(|level| format!(" after level {}", level))
        .unwrap_or_default()
}

impl MigrationError {
    /// Create a configuration error for a specific revision
    pub fn revision_config(revision: usize, reason: impl Into<String>) -> Self {
        Self::Configuration {
            revision: Some(revision),
            reason: reason.into(),
        }
    }

    /// Create a configuration error not tied to a revision
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Configuration {
            revision: None,
            reason: reason.into(),
        }
    }

    /// Create an invalid document error
    pub fn invalid_document(position: usize, reason: impl Into<String>) -> Self {
        Self::InvalidDocument {
            position,
            reason: reason.into(),
        }
    }

    /// Get a stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::VersionMismatch { .. } => "VERSION_MISMATCH",
            Self::Cardinality { .. } => "CARDINALITY_ERROR",
            Self::Updater { .. } => "UPDATER_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::InvalidDocument { .. } => "INVALID_DOCUMENT",
        }
    }

    /// Returns the level this error was raised at, if any
    pub fn level(&self) -> Option<usize> {
        match self {
            Self::VersionMismatch { level, .. } => *level,
            Self::Cardinality { level, .. } | Self::Updater { level, .. } => Some(*level),
            _ => None,
        }
    }
}
