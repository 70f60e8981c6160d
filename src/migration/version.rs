//! Version field access
//!
//! The version lives in a top-level integer field (`_v` unless configured
//! otherwise). It is read afresh at every level, never cached.

use serde_json::Value;

/// Default name of the version field
pub const VERSION_FIELD: &str = "_v";

/// What a document says about its own version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionState {
    /// A non-negative integer version
    Present(u64),
    /// The field is absent
    Missing,
    /// The field holds something other than a non-negative integer
    Malformed,
}

impl VersionState {
    /// Returns the version if present
    pub fn as_version(&self) -> Option<u64> {
        match self {
            VersionState::Present(v) => Some(*v),
            _ => None,
        }
    }
}

/// Read the version of a document
pub fn document_version(doc: &Value, field: &str) -> VersionState {
    match doc.get(field) {
        None => VersionState::Missing,
        Some(value) => value
            .as_u64()
            .map(VersionState::Present)
            .unwrap_or(VersionState::Malformed),
    }
}

/// Set the version of a document
///
/// Non-object values are left untouched.
pub fn set_version(doc: &mut Value, field: &str, version: u64) {
    if let Some(obj) = doc.as_object_mut() {
        obj.insert(field.to_string(), Value::from(version));
    }
}

/// Render the version field for error messages
pub(crate) fn describe_version(doc: &Value, field: &str) -> String {
    match doc.get(field) {
        None => "missing".to_string(),
        Some(value) => value.to_string(),
    }
}
