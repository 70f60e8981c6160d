//! Revisions: one upgrade step per version
//!
//! A revision is identified only by its position in the chain. Revision `i`
//! receives documents at version `i` and must hand them back at `i + 1`.

use std::fmt;
use std::future::{self, Future};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;

use super::errors::{MigrationError, MigrationResult};
use crate::BoxError;

/// Upgrades one document
pub type DocumentUpdater =
    Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, BoxError>> + Send + Sync>;

/// Upgrades every document at one version in a single call
pub type BatchUpdater =
    Arc<dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Vec<Value>, BoxError>> + Send + Sync>;

/// The updater a revision resolved to
#[derive(Clone)]
pub enum Updater {
    PerDocument(DocumentUpdater),
    Batch(BatchUpdater),
}

impl Updater {
    pub fn kind(&self) -> &'static str {
        match self {
            Updater::PerDocument(_) => "per_document",
            Updater::Batch(_) => "batch",
        }
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Updater::{}", self.kind())
    }
}

/// Declaration of a chain step
///
/// Exactly one of the two updater kinds must be declared. The check happens
/// when the chain is turned into a [`Schema`](super::Schema).
///
/// ```ignore
/// let by_doc = Revision::per_document(|mut doc| async move {
///     doc["_v"] = json!(1);
///     Ok(doc)
/// });
///
/// let in_bulk = Revision::batch(|docs| async move {
///     Ok(docs.into_iter().map(|mut d| { d["_v"] = json!(2); d }).collect())
/// });
/// ```
#[derive(Clone, Default)]
pub struct Revision {
    update: Option<DocumentUpdater>,
    update_batch: Option<BatchUpdater>,
}

impl Revision {
    /// Create a revision declaring no updater yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a revision with an async per-document updater
    pub fn per_document<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        Self::new().with_update(f)
    }

    /// Create a revision with an async batch updater
    pub fn batch<F, Fut>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Value>, BoxError>> + Send + 'static,
    {
        Self::new().with_batch_update(f)
    }

    /// Create a revision from a synchronous per-document transform
    pub fn map<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::per_document(move |doc| future::ready(f(doc)))
    }

    /// Declare the per-document updater
    pub fn with_update<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        self.update = Some(Arc::new(move |doc| f(doc).boxed()));
        self
    }

    /// Declare the batch updater
    pub fn with_batch_update<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Value>, BoxError>> + Send + 'static,
    {
        self.update_batch = Some(Arc::new(move |docs| f(docs).boxed()));
        self
    }

    pub fn has_update(&self) -> bool {
        self.update.is_some()
    }

    pub fn has_batch_update(&self) -> bool {
        self.update_batch.is_some()
    }

    /// Resolve the declaration into its single updater
    pub fn resolve(&self, index: usize) -> MigrationResult<Updater> {
        match (&self.update, &self.update_batch) {
            (Some(update), None) => Ok(Updater::PerDocument(Arc::clone(update))),
            (None, Some(update_batch)) => Ok(Updater::Batch(Arc::clone(update_batch))),
            (None, None) => Err(MigrationError::revision_config(
                index,
                "declares neither a per-document nor a batch updater",
            )),
            (Some(_), Some(_)) => Err(MigrationError::revision_config(
                index,
                "declares both a per-document and a batch updater",
            )),
        }
    }
}

impl fmt::Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Revision")
            .field("update", &self.has_update())
            .field("update_batch", &self.has_batch_update())
            .finish()
    }
}
