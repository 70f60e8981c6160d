//! Observability for the migration engine
//!
//! - Structured logging (JSON lines)
//! - Counters for calls, levels and documents
//! - Begin/complete scopes around each call
//!
//! Observability is read-only: nothing here changes what a migration does.

mod logger;
mod metrics;
mod scope;

pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, MigrationMetrics};
pub use scope::ObservationScope;
