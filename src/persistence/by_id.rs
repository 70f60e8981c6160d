//! By-identifier adapter
//!
//! Replaces each stored document with its migrated value, addressed by the
//! document's own identifier.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use super::adapter::PersistenceAdapter;
use super::errors::{PersistenceError, PersistenceResult};
use crate::migration::{Payload, Schema, ID_FIELD};
use crate::observability::Logger;
use crate::storage::{DocumentCollection, DocumentId};

/// Writes migrated documents back over their stored originals
pub struct ByIdAdapter {
    collection: Arc<dyn DocumentCollection>,
    id_field: String,
    bulk: bool,
}

impl ByIdAdapter {
    pub fn new(collection: Arc<dyn DocumentCollection>) -> Self {
        Self {
            collection,
            id_field: ID_FIELD.to_string(),
            bulk: false,
        }
    }

    /// Adapter reading identifiers from the field a schema is configured with
    pub fn for_schema(collection: Arc<dyn DocumentCollection>, schema: &Schema) -> Self {
        Self::new(collection).with_id_field(schema.config().id_field.clone())
    }

    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Use one bulk write instead of one write per document
    pub fn bulk(mut self) -> Self {
        self.bulk = true;
        self
    }

    fn replacements(&self, migrated: &Payload) -> PersistenceResult<Vec<(DocumentId, Value)>> {
        migrated
            .documents()
            .enumerate()
            .map(|(position, document)| {
                let id = DocumentId::from_document(document, &self.id_field).ok_or_else(|| {
                    PersistenceError::MissingId {
                        position,
                        field: self.id_field.clone(),
                    }
                })?;
                Ok((id, document.clone()))
            })
            .collect()
    }
}

impl PersistenceAdapter for ByIdAdapter {
    fn persist<'a>(&'a self, migrated: &'a Payload) -> BoxFuture<'a, PersistenceResult<()>> {
        Box::pin(async move {
            let replacements = self.replacements(migrated)?;
            if replacements.is_empty() {
                return Ok(());
            }

            let count = replacements.len().to_string();
            if self.bulk {
                self.collection.replace_many(replacements).await?;
            } else {
                for (id, document) in replacements {
                    self.collection.replace_one(&id, document).await?;
                }
            }

            Logger::trace(
                "PERSIST_BY_ID",
                &[("documents", &count), ("bulk", if self.bulk { "true" } else { "false" })],
            );
            Ok(())
        })
    }
}
