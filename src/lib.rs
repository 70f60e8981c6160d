//! docmigrate - Lazy, leveled version migration for schemaless documents
//!
//! Documents carry an integer `_v` field. A [`Schema`] holds an ordered chain of
//! [`Revision`]s; revision `i` lifts a document from version `i` to `i + 1`.
//! Migrating a document, a list of documents, or an absent value applies only
//! the revisions each document still needs, batching documents that share a
//! version, and optionally hands the result to a [`PersistenceAdapter`].
//!
//! ```ignore
//! use docmigrate::{Revision, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::new(vec![
//!     Revision::map(|mut doc| {
//!         doc["name"] = doc["title"].take();
//!         doc["_v"] = json!(1);
//!         Ok(doc)
//!     }),
//! ])?;
//!
//! let doc = schema.migrate_one(json!({"_v": 0, "title": "hello"})).await?;
//! assert_eq!(doc["name"], "hello");
//! ```

pub mod migration;
pub mod observability;
pub mod persistence;
pub mod storage;

pub use migration::{
    Absence, MigrationError, MigrationPlan, MigrationResult, MissingVersionPolicy, Payload,
    Revision, Schema, SchemaConfig,
};
pub use persistence::{ByIdAdapter, EmbeddedFieldAdapter, PersistenceAdapter, PersistenceError};
pub use storage::{DocumentCollection, DocumentId, InMemoryCollection, StorageError};

/// Boxed error type returned by updaters and custom sinks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
