//! Embedded-field adapter
//!
//! For documents that live inside a field of another document: the migrated
//! value(s) are written back into `field` of the base document(s).
//!
//! - One base document: the whole migrated value (document or list) goes
//!   into that base's field.
//! - A list of base documents: the migrated payload must be a list of the
//!   same length, element `i` goes into base `i`.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use super::adapter::PersistenceAdapter;
use super::errors::{PersistenceError, PersistenceResult};
use crate::migration::{Payload, ID_FIELD};
use crate::observability::Logger;
use crate::storage::{DocumentCollection, DocumentId};

/// Writes migrated embedded values into their base documents
pub struct EmbeddedFieldAdapter {
    collection: Arc<dyn DocumentCollection>,
    base: Payload,
    field: String,
    id_field: String,
    bulk: bool,
}

impl EmbeddedFieldAdapter {
    pub fn new(
        collection: Arc<dyn DocumentCollection>,
        base: impl Into<Payload>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            collection,
            base: base.into(),
            field: field.into(),
            id_field: ID_FIELD.to_string(),
            bulk: false,
        }
    }

    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Use one bulk write instead of one write per base document
    pub fn bulk(mut self) -> Self {
        self.bulk = true;
        self
    }

    fn base_id(&self, position: usize, base: &Value) -> PersistenceResult<DocumentId> {
        DocumentId::from_document(base, &self.id_field).ok_or_else(|| PersistenceError::MissingId {
            position,
            field: self.id_field.clone(),
        })
    }

    /// Pair every base identifier with the value its field receives
    fn updates(&self, migrated: &Payload) -> PersistenceResult<Vec<(DocumentId, Value)>> {
        match (&self.base, migrated) {
            (_, Payload::Absent(_)) => Ok(Vec::new()),
            (Payload::Absent(_), _) => Err(PersistenceError::correspondence(
                "no base document to embed into",
            )),
            (Payload::Single(base), value) => {
                Ok(vec![(self.base_id(0, base)?, value.clone().into_value())])
            }
            (Payload::Many(bases), Payload::Many(values)) => {
                if bases.len() != values.len() {
                    return Err(PersistenceError::correspondence(format!(
                        "{} migrated values for {} base documents",
                        values.len(),
                        bases.len()
                    )));
                }
                bases
                    .iter()
                    .zip(values)
                    .enumerate()
                    .map(|(position, (base, value))| Ok((self.base_id(position, base)?, value.clone())))
                    .collect()
            }
            (Payload::Many(bases), Payload::Single(_)) => Err(PersistenceError::correspondence(
                format!("a single migrated value for {} base documents", bases.len()),
            )),
        }
    }
}

impl PersistenceAdapter for EmbeddedFieldAdapter {
    fn persist<'a>(&'a self, migrated: &'a Payload) -> BoxFuture<'a, PersistenceResult<()>> {
        Box::pin(async move {
            let updates = self.updates(migrated)?;
            if updates.is_empty() {
                return Ok(());
            }

            let count = updates.len().to_string();
            if self.bulk {
                self.collection.update_field_many(&self.field, updates).await?;
            } else {
                for (id, value) in updates {
                    self.collection.update_field(&id, &self.field, value).await?;
                }
            }

            Logger::trace(
                "PERSIST_EMBEDDED_FIELD",
                &[("bases", &count), ("field", &self.field)],
            );
            Ok(())
        })
    }
}
