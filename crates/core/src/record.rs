//! Metadata records and their reserved fields

use chrono::Utc;
use serde_json::{Map, Value};

/// A metadata record: field name to JSON value.
pub type Record = Map<String, Value>;

/// Record-type discriminator. Never stored as a source field.
pub const TYPE_FIELD: &str = "_type";

/// Destination index of a bulk action.
pub const INDEX_FIELD: &str = "_index";

/// Document id of a bulk action.
pub const ID_FIELD: &str = "_id";

/// Time the record was reported, seconds since the Unix epoch.
pub const TIME_RECORDED_FIELD: &str = "time_recorded";

/// Document type used when a bulk record carries no `_type`.
pub const DEFAULT_DOC_TYPE: &str = "metadata";

/// Current time as fractional seconds since the Unix epoch.
pub fn epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Merge `extra` into `record`, overriding fields of the same name.
pub fn merge_fields(record: &mut Record, extra: &Record) {
    for (key, value) in extra {
        record.insert(key.clone(), value.clone());
    }
}

/// Set `time_recorded` to now.
///
/// With `keep_existing`, a value already present is left untouched.
pub fn stamp_time_recorded(record: &mut Record, keep_existing: bool) {
    if keep_existing && record.contains_key(TIME_RECORDED_FIELD) {
        return;
    }
    record.insert(TIME_RECORDED_FIELD.to_string(), Value::from(epoch_seconds()));
}
