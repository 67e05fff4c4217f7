// Raw API document shape and one-level flattening

use serde_json::{Map, Value};
use tracing::debug;

/// A JSON value classified the way the flattener treats it
#[derive(Debug, Clone, PartialEq)]
pub enum RawNode {
    /// Strings, numbers, booleans and null
    Scalar(Value),
    /// A JSON object, i.e. one job listing
    Record(Map<String, Value>),
    /// A JSON array, possibly a page of job listings
    Sequence(Vec<Value>),
}

impl From<Value> for RawNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => RawNode::Record(map),
            Value::Array(items) => RawNode::Sequence(items),
            other => RawNode::Scalar(other),
        }
    }
}

/// One job-listing observation, fields kept in document order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatRecord {
    fields: Map<String, Value>,
}

impl FlatRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for FlatRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Flatten the container's elements one level.
///
/// Records are kept, sequences contribute their record members in order, and
/// anything else is skipped. Relative order is preserved within and across
/// nested sequences.
pub fn flatten(items: Vec<Value>) -> Vec<FlatRecord> {
    let mut records = Vec::with_capacity(items.len());
    let mut skipped = 0usize;

    for item in items {
        match RawNode::from(item) {
            RawNode::Record(fields) => records.push(FlatRecord::from(fields)),
            RawNode::Sequence(members) => {
                for member in members {
                    match RawNode::from(member) {
                        RawNode::Record(fields) => records.push(FlatRecord::from(fields)),
                        RawNode::Sequence(_) | RawNode::Scalar(_) => skipped += 1,
                    }
                }
            },
            RawNode::Scalar(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, "Skipped non-record elements while flattening");
    }

    records
}

/// Short name of a JSON value's kind, for error messages
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
