//! Migration engine and its building blocks
//!
//! - `revision`: chain steps and their two updater kinds
//! - `payload`: the shapes a caller can hand in (document, list, absence)
//! - `executor`: one level of the chain against a working set
//! - `schema`: the engine driving every level, then the adapter
//!
//! Levels run strictly in order. Documents never move backwards: revision `k`
//! only sees documents at version `k` and must return them at `k + 1`.

mod config;
mod errors;
mod executor;
mod payload;
mod plan;
mod revision;
mod schema;
mod version;

pub use config::{MissingVersionPolicy, SchemaConfig, DEFAULT_MAX_CONCURRENCY, ID_FIELD};
pub use errors::{MigrationError, MigrationResult};
pub use executor::{LevelExecutor, LevelOutcome, WorkingEntry, WorkingSet};
pub use payload::{Absence, Payload};
pub use plan::{LevelPlan, MigrationPlan};
pub use revision::{BatchUpdater, DocumentUpdater, Revision, Updater};
pub use schema::Schema;
pub use version::{document_version, set_version, VersionState, VERSION_FIELD};
