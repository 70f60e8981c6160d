//! Storage collection capability
//!
//! The engine never talks to storage. Only the persistence adapters do, and
//! only through this trait: replace a document, or set one field of it.

use std::fmt;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::StorageResult;

/// Opaque document identifier
///
/// String and integer identifiers are both accepted. Integers are kept in
/// their decimal form, so `7` and `"7"` name the same document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Extract the identifier held in `field` of a document
    pub fn from_document(document: &Value, field: &str) -> Option<Self> {
        match document.get(field)? {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<uuid::Uuid> for DocumentId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id.to_string())
    }
}

/// A collection the persistence adapters can write to
///
/// Bulk forms default to one single write per item, in order. Backends with
/// a real bulk write should override them.
pub trait DocumentCollection: Send + Sync {
    /// Replace the stored document with `id`
    fn replace_one<'a>(&'a self, id: &'a DocumentId, document: Value) -> BoxFuture<'a, StorageResult<()>>;

    /// Set `field` of the stored document with `id`
    fn update_field<'a>(
        &'a self,
        id: &'a DocumentId,
        field: &'a str,
        value: Value,
    ) -> BoxFuture<'a, StorageResult<()>>;

    /// Replace several documents
    fn replace_many<'a>(&'a self, documents: Vec<(DocumentId, Value)>) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move {
            for (id, document) in documents {
                self.replace_one(&id, document).await?;
            }
            Ok(())
        })
    }

    /// Set `field` on several documents
    fn update_field_many<'a>(
        &'a self,
        field: &'a str,
        updates: Vec<(DocumentId, Value)>,
    ) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move {
            for (id, value) in updates {
                self.update_field(&id, field, value).await?;
            }
            Ok(())
        })
    }
}
