//! Migration engine
//!
//! A [`Schema`] owns a resolved revision chain. Each call normalizes its input
//! into a position-tracked working set, runs every level in chain order,
//! checks that every document reached the target version, hands the result
//! to the optional adapter and restores the caller's shape.
//!
//! Calls share nothing but the immutable chain and the metrics counters, so
//! one schema can serve concurrent calls.

use std::sync::Arc;

use serde_json::Value;

use super::config::SchemaConfig;
use super::errors::{MigrationError, MigrationResult};
use super::executor::{effective_version, LevelExecutor, WorkingSet};
use super::payload::Payload;
use super::plan::MigrationPlan;
use super::revision::{Revision, Updater};
use super::version::describe_version;
use crate::observability::{MigrationMetrics, ObservationScope};
use crate::persistence::PersistenceAdapter;

/// A versioned revision chain and the engine that applies it
#[derive(Clone)]
pub struct Schema {
    chain: Arc<[Updater]>,
    config: Arc<SchemaConfig>,
    metrics: Arc<MigrationMetrics>,
}

impl Schema {
    /// Build a schema with the default configuration
    ///
    /// Fails if any revision declares zero or two updaters.
    pub fn new(revisions: Vec<Revision>) -> MigrationResult<Self> {
        Self::with_config(revisions, SchemaConfig::default())
    }

    pub fn with_config(revisions: Vec<Revision>, config: SchemaConfig) -> MigrationResult<Self> {
        config.validate()?;

        let chain = revisions
            .iter()
            .enumerate()
            .map(|(index, revision)| revision.resolve(index))
            .collect::<MigrationResult<Vec<_>>>()?;

        Ok(Self {
            chain: chain.into(),
            config: Arc::new(config),
            metrics: Arc::new(MigrationMetrics::new()),
        })
    }

    /// Record into a shared metrics instance
    pub fn with_metrics(mut self, metrics: Arc<MigrationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<MigrationMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// Version every migrated document ends at: the chain length
    pub fn target_version(&self) -> u64 {
        self.chain.len() as u64
    }

    /// Returns true if the document is below the target version
    ///
    /// A document the engine would reject does not need migration; it
    /// cannot be migrated either.
    pub fn needs_migration(&self, document: &Value) -> bool {
        self.entry_version(0, document)
            .map(|version| version < self.target_version())
            .unwrap_or(false)
    }

    /// Describe what migrating `input` would do, without running anything
    pub fn plan(&self, input: &Payload) -> MigrationResult<MigrationPlan> {
        let versions = input
            .documents()
            .enumerate()
            .map(|(position, document)| self.entry_version(position, document))
            .collect::<MigrationResult<Vec<_>>>()?;

        Ok(MigrationPlan::build(&versions, &self.chain))
    }

    /// Migrate a document, a list of documents, or an absent value
    pub async fn migrate(&self, input: impl Into<Payload>) -> MigrationResult<Payload> {
        self.run(input.into(), None).await
    }

    /// Migrate, then persist the fully migrated result through `adapter`
    ///
    /// The adapter runs once, and only if every document reached the target
    /// version. An absent input is returned without calling it.
    pub async fn migrate_with(
        &self,
        input: impl Into<Payload>,
        adapter: &dyn PersistenceAdapter,
    ) -> MigrationResult<Payload> {
        self.run(input.into(), Some(adapter)).await
    }

    /// Migrate exactly one document
    ///
    /// `null` and `false` are treated as a document here, not as absence.
    pub async fn migrate_one(&self, document: Value) -> MigrationResult<Value> {
        self.run(Payload::Single(document), None)
            .await
            .map(Payload::into_value)
    }

    /// Migrate a list of documents, keeping their order
    pub async fn migrate_many(&self, documents: Vec<Value>) -> MigrationResult<Vec<Value>> {
        match self.run(Payload::Many(documents), None).await? {
            Payload::Many(documents) => Ok(documents),
            other => Ok(other.documents().cloned().collect()),
        }
    }

    async fn run(
        &self,
        input: Payload,
        adapter: Option<&dyn PersistenceAdapter>,
    ) -> MigrationResult<Payload> {
        let set = match WorkingSet::from_payload(input) {
            Ok(set) => set,
            Err(absence) => return Ok(Payload::Absent(absence)),
        };

        self.metrics.increment_calls();
        let scope = ObservationScope::with_fields(
            "MIGRATION",
            vec![
                ("documents", set.len().to_string()),
                ("target_version", self.target_version().to_string()),
            ],
        );

        match self.run_set(set, adapter).await {
            Ok(output) => {
                scope.complete();
                Ok(output)
            }
            Err(err) => {
                self.metrics.increment_failures();
                scope.fail(&err.to_string());
                Err(err)
            }
        }
    }

    async fn run_set(
        &self,
        mut set: WorkingSet,
        adapter: Option<&dyn PersistenceAdapter>,
    ) -> MigrationResult<Payload> {
        for entry in set.entries() {
            self.entry_version(entry.position, &entry.document)?;
        }

        let executor = LevelExecutor::new(&self.chain, &self.config, &self.metrics);
        for level in 0..self.chain.len() {
            executor.run_level(level, &mut set).await?;
        }

        self.verify_complete(&set)?;

        let output = set.into_payload();
        if let Some(adapter) = adapter {
            adapter.persist(&output).await?;
            self.metrics.increment_persisted_calls();
        }

        Ok(output)
    }

    /// Version of an input document, rejecting what the engine cannot migrate
    fn entry_version(&self, position: usize, document: &Value) -> MigrationResult<u64> {
        if !document.is_object() {
            return Err(MigrationError::invalid_document(
                position,
                format!("expected an object, got {}", kind_of(document)),
            ));
        }
        effective_version(document, position, &self.config)
    }

    /// Every document must sit exactly at the target version
    fn verify_complete(&self, set: &WorkingSet) -> MigrationResult<()> {
        let target = self.target_version();
        for entry in set.entries() {
            let reached = effective_version(&entry.document, entry.position, &self.config)?;
            if reached != target {
                return Err(MigrationError::VersionMismatch {
                    level: None,
                    position: entry.position,
                    expected: target,
                    found: describe_version(&entry.document, &self.config.version_field),
                });
            }
        }
        Ok(())
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
