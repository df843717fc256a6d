//! Helpers for tests in this workspace

use serde_json::Value;

use crate::record::Record;

/// Build a record from a JSON object literal.
///
/// # Panics
///
/// Panics if `value` is not a JSON object.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("record literal must be a JSON object, got {}", other),
    }
}
