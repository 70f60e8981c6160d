//! Migration counters
//!
//! - Counters only, monotonic
//! - Thread-safe, Relaxed ordering
//! - Shared between clones of a schema through `Arc`

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing what the engine has done
#[derive(Debug, Default)]
pub struct MigrationMetrics {
    /// Engine calls with at least one document
    calls: AtomicU64,
    /// Calls that ended in an error
    failures: AtomicU64,
    /// Levels that upgraded at least one document
    revisions_applied: AtomicU64,
    /// Single-document upgrades across all levels
    documents_upgraded: AtomicU64,
    /// Batch updater invocations
    batch_calls: AtomicU64,
    /// Successful persistence adapter invocations
    persisted_calls: AtomicU64,
}

impl MigrationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_calls(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_revisions_applied(&self) {
        self.revisions_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_documents_upgraded(&self, count: u64) {
        self.documents_upgraded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_batch_calls(&self) {
        self.batch_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_persisted_calls(&self) {
        self.persisted_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as JSON
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "calls": self.calls.load(Ordering::Relaxed),
            "failures": self.failures.load(Ordering::Relaxed),
            "revisions_applied": self.revisions_applied.load(Ordering::Relaxed),
            "documents_upgraded": self.documents_upgraded.load(Ordering::Relaxed),
            "batch_calls": self.batch_calls.load(Ordering::Relaxed),
            "persisted_calls": self.persisted_calls.load(Ordering::Relaxed),
        })
        .to_string()
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            revisions_applied: self.revisions_applied.load(Ordering::Relaxed),
            documents_upgraded: self.documents_upgraded.load(Ordering::Relaxed),
            batch_calls: self.batch_calls.load(Ordering::Relaxed),
            persisted_calls: self.persisted_calls.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub calls: u64,
    pub failures: u64,
    pub revisions_applied: u64,
    pub documents_upgraded: u64,
    pub batch_calls: u64,
    pub persisted_calls: u64,
}
