//! Input and output shapes of a migration call

use serde_json::Value;

/// The kind of absent value a caller passed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absence {
    /// Nothing at all (`None`)
    Undefined,
    /// JSON `null`
    Null,
    /// JSON `false`
    False,
}

impl Absence {
    /// JSON rendering of the absent value
    pub fn to_value(self) -> Value {
        match self {
            Absence::Undefined | Absence::Null => Value::Null,
            Absence::False => Value::Bool(false),
        }
    }
}

/// What gets migrated, and what comes back in the same shape
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Returned unchanged, nothing runs
    Absent(Absence),
    /// One document
    Single(Value),
    /// An ordered list of documents
    Many(Vec<Value>),
}

impl Payload {
    /// Returns true for the absent variant
    pub fn is_absent(&self) -> bool {
        matches!(self, Payload::Absent(_))
    }

    /// Number of documents carried
    pub fn len(&self) -> usize {
        match self {
            Payload::Absent(_) => 0,
            Payload::Single(_) => 1,
            Payload::Many(docs) => docs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_single(&self) -> Option<&Value> {
        match self {
            Payload::Single(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_many(&self) -> Option<&[Value]> {
        match self {
            Payload::Many(docs) => Some(docs),
            _ => None,
        }
    }

    /// Iterate over the documents carried, in order
    pub fn documents(&self) -> impl Iterator<Item = &Value> {
        let slice: &[Value] = match self {
            Payload::Absent(_) => &[],
            Payload::Single(doc) => std::slice::from_ref(doc),
            Payload::Many(docs) => docs,
        };
        slice.iter()
    }

    /// Collapse back into a single JSON value
    pub fn into_value(self) -> Value {
        match self {
            Payload::Absent(absence) => absence.to_value(),
            Payload::Single(doc) => doc,
            Payload::Many(docs) => Value::Array(docs),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Payload::Absent(Absence::Null),
            Value::Bool(false) => Payload::Absent(Absence::False),
            Value::Array(docs) => Payload::Many(docs),
            other => Payload::Single(other),
        }
    }
}

impl From<Option<Value>> for Payload {
    fn from(value: Option<Value>) -> Self {
        value
            .map(Payload::from)
            .unwrap_or(Payload::Absent(Absence::Undefined))
    }
}

impl From<Absence> for Payload {
    fn from(absence: Absence) -> Self {
        Payload::Absent(absence)
    }
}

impl From<Vec<Value>> for Payload {
    fn from(docs: Vec<Value>) -> Self {
        Payload::Many(docs)
    }
}

impl From<Payload> for Value {
    fn from(payload: Payload) -> Self {
        payload.into_value()
    }
}
