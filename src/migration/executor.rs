//! Level executor
//!
//! Applies revision `k` to exactly the documents currently at version `k`,
//! validates what comes back and merges it into the working set by position.

use futures_util::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;

use super::config::{MissingVersionPolicy, SchemaConfig};
use super::errors::{MigrationError, MigrationResult};
use super::payload::{Absence, Payload};
use super::revision::Updater;
use super::version::{describe_version, document_version, VersionState};
use crate::observability::{Logger, MigrationMetrics};

/// A document under migration, tagged with its input position
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingEntry {
    pub position: usize,
    pub document: Value,
}

/// Position-tracked collection of documents under migration
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingSet {
    entries: Vec<WorkingEntry>,
    single: bool,
}

impl WorkingSet {
    /// Build a working set from a payload
    ///
    /// An absent payload has nothing to migrate and hands its sentinel back.
    pub fn from_payload(payload: Payload) -> Result<Self, Absence> {
        let (documents, single) = match payload {
            Payload::Absent(absence) => return Err(absence),
            Payload::Single(doc) => (vec![doc], true),
            Payload::Many(docs) => (docs, false),
        };

        let entries = documents
            .into_iter()
            .enumerate()
            .map(|(position, document)| WorkingEntry { position, document })
            .collect();

        Ok(Self { entries, single })
    }

    /// Restore the caller's shape and order
    pub fn into_payload(mut self) -> Payload {
        self.entries.sort_by_key(|entry| entry.position);
        let mut documents = self.entries.into_iter().map(|entry| entry.document);

        if self.single {
            Payload::Single(documents.next().unwrap_or(Value::Null))
        } else {
            Payload::Many(documents.collect())
        }
    }

    pub fn entries(&self) -> &[WorkingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read the effective version of a document under the configured policy
pub(crate) fn effective_version(
    document: &Value,
    position: usize,
    config: &SchemaConfig,
) -> MigrationResult<u64> {
    match document_version(document, &config.version_field) {
        VersionState::Present(version) => Ok(version),
        VersionState::Missing => match config.missing_version {
            MissingVersionPolicy::DefaultToZero => Ok(0),
            MissingVersionPolicy::Reject => Err(MigrationError::invalid_document(
                position,
                format!("missing version field '{}'", config.version_field),
            )),
        },
        VersionState::Malformed => Err(MigrationError::invalid_document(
            position,
            format!(
                "version field '{}' is not a non-negative integer: {}",
                config.version_field,
                describe_version(document, &config.version_field)
            ),
        )),
    }
}

/// Result of running one level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelOutcome {
    pub level: usize,
    /// Number of documents the revision upgraded
    pub applied: usize,
}

/// Runs single revisions against a working set
pub struct LevelExecutor<'a> {
    chain: &'a [Updater],
    config: &'a SchemaConfig,
    metrics: &'a MigrationMetrics,
}

impl<'a> LevelExecutor<'a> {
    pub fn new(chain: &'a [Updater], config: &'a SchemaConfig, metrics: &'a MigrationMetrics) -> Self {
        Self {
            chain,
            config,
            metrics,
        }
    }

    /// Apply revision `level` to every document currently at version `level`
    pub async fn run_level(&self, level: usize, set: &mut WorkingSet) -> MigrationResult<LevelOutcome> {
        let updater = self.chain.get(level).ok_or_else(|| {
            MigrationError::config(format!(
                "level {} is outside a chain of {} revisions",
                level,
                self.chain.len()
            ))
        })?;

        let mut eligible = Vec::new();
        for (index, entry) in set.entries.iter().enumerate() {
            if effective_version(&entry.document, entry.position, self.config)? == level as u64 {
                eligible.push(index);
            }
        }

        if eligible.is_empty() {
            return Ok(LevelOutcome { level, applied: 0 });
        }

        // Each level hands the updater its own copy and replaces it afterwards
        let inputs: Vec<Value> = eligible
            .iter()
            .map(|&index| std::mem::take(&mut set.entries[index].document))
            .collect();

        let outputs = match updater {
            Updater::PerDocument(update) => stream::iter(inputs.into_iter().map(|doc| update(doc)))
                .buffered(self.config.max_concurrency)
                .try_collect::<Vec<Value>>()
                .await
                .map_err(|source| MigrationError::Updater { level, source })?,
            Updater::Batch(update_batch) => {
                self.metrics.increment_batch_calls();
                let expected = inputs.len();
                let outputs = update_batch(inputs)
                    .await
                    .map_err(|source| MigrationError::Updater { level, source })?;

                if outputs.len() != expected {
                    return Err(MigrationError::Cardinality {
                        level,
                        expected,
                        actual: outputs.len(),
                    });
                }
                outputs
            }
        };

        let next_version = level as u64 + 1;
        for (&index, output) in eligible.iter().zip(&outputs) {
            let found = document_version(output, &self.config.version_field);
            if found.as_version() != Some(next_version) {
                return Err(MigrationError::VersionMismatch {
                    level: Some(level),
                    position: set.entries[index].position,
                    expected: next_version,
                    found: describe_version(output, &self.config.version_field),
                });
            }
        }

        let applied = outputs.len();
        for (index, output) in eligible.into_iter().zip(outputs) {
            set.entries[index].document = output;
        }

        self.metrics.increment_revisions_applied();
        self.metrics.add_documents_upgraded(applied as u64);

        Logger::trace(
            "MIGRATION_LEVEL_APPLIED",
            &[
                ("level", &level.to_string()),
                ("documents", &applied.to_string()),
                ("updater", updater.kind()),
            ],
        );

        Ok(LevelOutcome { level, applied })
    }
}
