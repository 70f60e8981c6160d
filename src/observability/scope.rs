//! ObservationScope for begin/complete logging around one engine call
//!
//! - Logs `{name}_BEGIN` on creation
//! - Logs `{name}_COMPLETE` on `complete()`
//! - Logs `{name}_FAILED` on `fail()`
//! - Logs `{name}_INCOMPLETE` when dropped otherwise (e.g. the caller
//!   abandoned the future)

use std::time::Instant;

use super::logger::Logger;

/// A scope that logs start and end events
///
/// ```ignore
/// let scope = ObservationScope::with_fields("MIGRATION", vec![("documents", "4".into())]);
/// // ... do work ...
/// scope.complete();
/// ```
pub struct ObservationScope {
    name: &'static str,
    fields: Vec<(&'static str, String)>,
    started: Instant,
    finished: bool,
}

impl ObservationScope {
    pub fn new(name: &'static str) -> Self {
        Self::with_fields(name, Vec::new())
    }

    pub fn with_fields(name: &'static str, fields: Vec<(&'static str, String)>) -> Self {
        Logger::info(&format!("{}_BEGIN", name), &borrow_fields(&fields));

        Self {
            name,
            fields,
            started: Instant::now(),
            finished: false,
        }
    }

    /// Logs `{name}_COMPLETE` with the elapsed time
    pub fn complete(mut self) {
        self.finished = true;
        let elapsed = self.elapsed_ms();
        let mut fields = borrow_fields(&self.fields);
        fields.push(("elapsed_ms", &elapsed));
        Logger::info(&format!("{}_COMPLETE", self.name), &fields);
    }

    /// Logs `{name}_FAILED` with the reason
    pub fn fail(mut self, reason: &str) {
        self.finished = true;
        let elapsed = self.elapsed_ms();
        let mut fields = borrow_fields(&self.fields);
        fields.push(("elapsed_ms", &elapsed));
        fields.push(("reason", reason));
        Logger::error(&format!("{}_FAILED", self.name), &fields);
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn elapsed_ms(&self) -> String {
        self.started.elapsed().as_millis().to_string()
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished {
            Logger::warn(
                &format!("{}_INCOMPLETE", self.name),
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}

fn borrow_fields<'a>(fields: &'a [(&'static str, String)]) -> Vec<(&'static str, &'a str)> {
    fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
}
