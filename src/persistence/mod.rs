//! Persistence adapters
//!
//! Pluggable sinks that write a fully migrated result back to storage.
//! An adapter is invoked once per engine call, only after every document
//! reached the target version, and its failure fails the call.
//!
//! Writes to several documents within one adapter call are not
//! transactional unless the backing collection makes them so.

mod adapter;
mod by_id;
mod embedded;
mod errors;

pub use adapter::{adapter_fn, FnAdapter, PersistenceAdapter};
pub use by_id::ByIdAdapter;
pub use embedded::EmbeddedFieldAdapter;
pub use errors::{PersistenceError, PersistenceResult};
