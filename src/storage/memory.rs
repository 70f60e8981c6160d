//! In-memory collection
//!
//! Reference `DocumentCollection` used by tests and by callers that keep
//! documents in process. Counts writes so callers can see how adapters
//! reached it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::sync::RwLock;

use super::collection::{DocumentCollection, DocumentId};
use super::errors::{StorageError, StorageResult};

/// Write counters of an in-memory collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteStats {
    pub replace_one: u64,
    pub replace_many: u64,
    pub update_field: u64,
    pub update_field_many: u64,
}

/// Documents held in a map keyed by identifier
pub struct InMemoryCollection {
    id_field: String,
    documents: RwLock<BTreeMap<DocumentId, Value>>,
    replace_one_calls: AtomicU64,
    replace_many_calls: AtomicU64,
    update_field_calls: AtomicU64,
    update_field_many_calls: AtomicU64,
}

impl InMemoryCollection {
    pub fn new() -> Self {
        Self::with_id_field(crate::migration::ID_FIELD)
    }

    pub fn with_id_field(id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            documents: RwLock::new(BTreeMap::new()),
            replace_one_calls: AtomicU64::new(0),
            replace_many_calls: AtomicU64::new(0),
            update_field_calls: AtomicU64::new(0),
            update_field_many_calls: AtomicU64::new(0),
        }
    }

    /// Insert a document, generating an identifier when it has none
    pub async fn insert(&self, mut document: Value) -> StorageResult<DocumentId> {
        let id = match DocumentId::from_document(&document, &self.id_field) {
            Some(id) => id,
            None => {
                let id = DocumentId::from(uuid::Uuid::new_v4());
                let obj = document
                    .as_object_mut()
                    .ok_or_else(|| StorageError::backend("only JSON objects can be stored"))?;
                obj.insert(self.id_field.clone(), Value::String(id.to_string()));
                id
            }
        };

        self.documents.write().await.insert(id.clone(), document);
        Ok(id)
    }

    pub async fn get(&self, id: &DocumentId) -> Option<Value> {
        self.documents.read().await.get(id).cloned()
    }

    /// All documents, ordered by identifier
    pub async fn all(&self) -> Vec<Value> {
        self.documents.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    pub fn write_stats(&self) -> WriteStats {
        WriteStats {
            replace_one: self.replace_one_calls.load(Ordering::Relaxed),
            replace_many: self.replace_many_calls.load(Ordering::Relaxed),
            update_field: self.update_field_calls.load(Ordering::Relaxed),
            update_field_many: self.update_field_many_calls.load(Ordering::Relaxed),
        }
    }
}

impl Default for InMemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

fn set_field(document: &mut Value, id: &DocumentId, field: &str, value: Value) -> StorageResult<()> {
    let obj = document.as_object_mut().ok_or_else(|| {
        StorageError::backend(format!("stored document {} is not an object", id))
    })?;
    obj.insert(field.to_string(), value);
    Ok(())
}

impl DocumentCollection for InMemoryCollection {
    fn replace_one<'a>(&'a self, id: &'a DocumentId, document: Value) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move {
            self.replace_one_calls.fetch_add(1, Ordering::Relaxed);
            let mut documents = self.documents.write().await;
            let stored = documents
                .get_mut(id)
                .ok_or_else(|| StorageError::NotFound(id.clone()))?;
            *stored = document;
            Ok(())
        })
    }

    fn update_field<'a>(
        &'a self,
        id: &'a DocumentId,
        field: &'a str,
        value: Value,
    ) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move {
            self.update_field_calls.fetch_add(1, Ordering::Relaxed);
            let mut documents = self.documents.write().await;
            let stored = documents
                .get_mut(id)
                .ok_or_else(|| StorageError::NotFound(id.clone()))?;
            set_field(stored, id, field, value)
        })
    }

    fn replace_many<'a>(&'a self, replacements: Vec<(DocumentId, Value)>) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move {
            self.replace_many_calls.fetch_add(1, Ordering::Relaxed);
            let mut documents = self.documents.write().await;

            // All or nothing within one bulk call
            if let Some((missing, _)) = replacements.iter().find(|(id, _)| !documents.contains_key(id)) {
                return Err(StorageError::NotFound(missing.clone()));
            }
            for (id, document) in replacements {
                documents.insert(id, document);
            }
            Ok(())
        })
    }

    fn update_field_many<'a>(
        &'a self,
        field: &'a str,
        updates: Vec<(DocumentId, Value)>,
    ) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move {
            self.update_field_many_calls.fetch_add(1, Ordering::Relaxed);
            let mut documents = self.documents.write().await;

            // All or nothing: every target must exist and be an object
            for (id, _) in &updates {
                match documents.get(id) {
                    None => return Err(StorageError::NotFound(id.clone())),
                    Some(stored) if !stored.is_object() => {
                        return Err(StorageError::backend(format!(
                            "stored document {} is not an object",
                            id
                        )))
                    }
                    Some(_) => {}
                }
            }
            for (id, value) in updates {
                if let Some(stored) = documents.get_mut(&id) {
                    set_field(stored, &id, field, value)?;
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_keeps_existing_id() {
        let collection = InMemoryCollection::new();
        let id = collection.insert(json!({"_id": "u1", "name": "a"})).await.unwrap();
        assert_eq!(id, DocumentId::from("u1"));
        assert_eq!(collection.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_generates_id() {
        let collection = InMemoryCollection::new();
        let id = collection.insert(json!({"name": "a"})).await.unwrap();
        let stored = collection.get(&id).await.unwrap();
        assert_eq!(stored["_id"], json!(id.as_str()));
    }

    #[tokio::test]
    async fn test_insert_rejects_scalar_without_id() {
        let collection = InMemoryCollection::new();
        assert!(collection.insert(json!(5)).await.is_err());
        assert!(collection.is_empty().await);
    }

    #[tokio::test]
    async fn test_replace_one() {
        let collection = InMemoryCollection::new();
        let id = collection.insert(json!({"_id": "a", "_v": 0})).await.unwrap();

        collection
            .replace_one(&id, json!({"_id": "a", "_v": 1}))
            .await
            .unwrap();

        assert_eq!(collection.get(&id).await.unwrap()["_v"], 1);
        assert_eq!(collection.write_stats().replace_one, 1);
    }

    #[tokio::test]
    async fn test_replace_one_missing() {
        let collection = InMemoryCollection::new();
        let err = collection
            .replace_one(&DocumentId::from("nope"), json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, StorageError::NotFound(DocumentId::from("nope")));
    }

    #[tokio::test]
    async fn test_update_field() {
        let collection = InMemoryCollection::new();
        let id = collection.insert(json!({"_id": "p", "title": "x"})).await.unwrap();

        collection
            .update_field(&id, "author", json!({"_v": 2}))
            .await
            .unwrap();

        assert_eq!(
            collection.get(&id).await.unwrap(),
            json!({"_id": "p", "title": "x", "author": {"_v": 2}})
        );
    }

    #[tokio::test]
    async fn test_replace_many_is_all_or_nothing() {
        let collection = InMemoryCollection::new();
        collection.insert(json!({"_id": "a", "_v": 0})).await.unwrap();

        let err = collection
            .replace_many(vec![
                (DocumentId::from("a"), json!({"_id": "a", "_v": 1})),
                (DocumentId::from("b"), json!({"_id": "b", "_v": 1})),
            ])
            .await
            .unwrap_err();

        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(collection.get(&DocumentId::from("a")).await.unwrap()["_v"], 0);
    }

    #[tokio::test]
    async fn test_update_field_many() {
        let collection = InMemoryCollection::new();
        collection.insert(json!({"_id": "a"})).await.unwrap();
        collection.insert(json!({"_id": "b"})).await.unwrap();

        collection
            .update_field_many(
                "tag",
                vec![
                    (DocumentId::from("a"), json!(1)),
                    (DocumentId::from("b"), json!(2)),
                ],
            )
            .await
            .unwrap();

        let all = collection.all().await;
        assert_eq!(all, vec![json!({"_id": "a", "tag": 1}), json!({"_id": "b", "tag": 2})]);
        assert_eq!(collection.write_stats().update_field_many, 1);
    }

    #[tokio::test]
    async fn test_update_field_many_rejects_non_object_before_writing() {
        let collection = InMemoryCollection::new();
        collection.insert(json!({"_id": "a"})).await.unwrap();
        collection.insert(json!({"_id": "b"})).await.unwrap();
        collection.replace_one(&"b".into(), json!(5)).await.unwrap();

        let err = collection
            .update_field_many(
                "tag",
                vec![
                    (DocumentId::from("a"), json!(1)),
                    (DocumentId::from("b"), json!(2)),
                ],
            )
            .await
            .unwrap_err();

        assert_eq!(err.code(), "BACKEND_ERROR");
        assert_eq!(collection.get(&"a".into()).await.unwrap(), json!({"_id": "a"}));
    }
}
