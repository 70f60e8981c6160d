//! Storage capability consumed by the persistence adapters
//!
//! The migration engine itself never queries or connects to storage. Callers
//! fetch source documents themselves; the adapters write migrated results
//! back through [`DocumentCollection`].
//!
//! # Operations
//!
//! - Replace a document by identifier (single and bulk)
//! - Update one field of a document by identifier (single and bulk)

mod collection;
mod errors;
mod memory;

pub use collection::{DocumentCollection, DocumentId};
pub use errors::{StorageError, StorageResult};
pub use memory::{InMemoryCollection, WriteStats};
