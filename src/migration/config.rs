//! Schema configuration
//!
//! Configured by the caller (in code or from a JSON file), immutable once a
//! schema is built.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{MigrationError, MigrationResult};
use super::version::VERSION_FIELD;

/// Default identifier field used by the persistence adapters
pub const ID_FIELD: &str = "_id";

/// Default bound on concurrent per-document updater calls within one level
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// What to do with a document that has no version field at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingVersionPolicy {
    /// Treat the document as version 0
    #[default]
    DefaultToZero,
    /// Reject the call with an invalid document error
    Reject,
}

/// Schema configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Name of the integer version field
    pub version_field: String,

    /// Name of the identifier field read by the persistence adapters
    pub id_field: String,

    /// Maximum number of per-document updater calls in flight within a level
    pub max_concurrency: usize,

    /// Handling of documents without a version field
    pub missing_version: MissingVersionPolicy,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            version_field: VERSION_FIELD.to_string(),
            id_field: ID_FIELD.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            missing_version: MissingVersionPolicy::default(),
        }
    }
}

impl SchemaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version_field(mut self, field: impl Into<String>) -> Self {
        self.version_field = field.into();
        self
    }

    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_missing_version(mut self, policy: MissingVersionPolicy) -> Self {
        self.missing_version = policy;
        self
    }

    /// Load a configuration from a JSON file
    ///
    /// Absent keys take their default values.
    pub fn load(path: impl AsRef<Path>) -> MigrationResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            MigrationError::config(format!("cannot read '{}': {}", path.display(), e))
        })?;

        let config: SchemaConfig = serde_json::from_str(&content).map_err(|e| {
            MigrationError::config(format!("malformed config '{}': {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> MigrationResult<()> {
        if self.max_concurrency == 0 {
            return Err(MigrationError::config("max_concurrency must be at least 1"));
        }
        if self.version_field.is_empty() {
            return Err(MigrationError::config("version_field must not be empty"));
        }
        if self.id_field.is_empty() {
            return Err(MigrationError::config("id_field must not be empty"));
        }
        Ok(())
    }
}
