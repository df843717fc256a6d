//! Search hits, engine responses and normalized results

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use crate::record::Record;

/// One matched document as the engine returns it.
///
/// A full-record hit carries `_source`; a projected hit carries `fields`,
/// where every value is a list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Index the document lives in
    #[serde(rename = "_index", default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    /// Document type
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    /// Document id
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Full stored record
    #[serde(rename = "_source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Record>,
    /// Field projection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Record>,
}

impl Hit {
    /// Hit carrying a full record.
    pub fn from_source(source: Record) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    /// Hit carrying a field projection.
    pub fn from_fields(fields: Record) -> Self {
        Self {
            fields: Some(fields),
            ..Self::default()
        }
    }

    /// Value of `key` used for client-side sorting.
    ///
    /// Reads `_source[key]` for full records and `fields[key][0]` for
    /// projections. Missing values read as `null`.
    pub fn sort_value(&self, key: &str) -> &Value {
        if let Some(source) = &self.source {
            return source.get(key).unwrap_or(&Value::Null);
        }
        match self.fields.as_ref().and_then(|f| f.get(key)) {
            Some(Value::Array(values)) => values.first().unwrap_or(&Value::Null),
            Some(other) => other,
            None => &Value::Null,
        }
    }

    /// Flatten into a record.
    ///
    /// Projected fields holding a single-element list are unwrapped to the
    /// scalar; longer lists stay lists. Without a projection the stored
    /// record is returned as is.
    pub fn normalize(self) -> Record {
        if let Some(fields) = self.fields {
            return fields
                .into_iter()
                .map(|(key, value)| match value {
                    Value::Array(mut values) if values.len() == 1 => (key, values.remove(0)),
                    other => (key, other),
                })
                .collect();
        }
        self.source.unwrap_or_default()
    }
}

/// `hits.total` is a bare number on older engines and `{value, relation}`
/// on newer ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    /// Bare count
    Count(u64),
    /// Object form
    Object {
        /// Match count
        value: u64,
    },
}

impl TotalHits {
    /// The match count.
    pub fn value(&self) -> u64 {
        match self {
            TotalHits::Count(n) => *n,
            TotalHits::Object { value } => *value,
        }
    }
}

impl Default for TotalHits {
    fn default() -> Self {
        TotalHits::Count(0)
    }
}

/// The `hits` section of a search response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitsEnvelope {
    /// Number of matching documents
    #[serde(default)]
    pub total: TotalHits,
    /// The returned page
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// A search response; fields other than `hits` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Scroll cursor, present when the search opened a scroll
    #[serde(rename = "_scroll_id", default, skip_serializing_if = "Option::is_none")]
    pub scroll_id: Option<String>,
    /// Matches
    #[serde(default)]
    pub hits: HitsEnvelope,
}

impl SearchResponse {
    /// Build a response from a total and a page of hits.
    pub fn new(total: u64, hits: Vec<Hit>) -> Self {
        Self {
            scroll_id: None,
            hits: HitsEnvelope {
                total: TotalHits::Count(total),
                hits,
            },
        }
    }

    /// Number of matching documents.
    pub fn total(&self) -> u64 {
        self.hits.total.value()
    }
}

/// Normalized query output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Number of matching documents reported by the engine
    pub total: u64,
    /// Normalized hits, in result order
    pub hits: Vec<Record>,
}

// ============================================================================
// Value ordering
// ============================================================================

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values.
///
/// Values of different kinds order null < bool < number < string < array
/// < object. Numbers compare as `f64`, arrays lexicographically, objects by
/// their serialized form.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.total_cmp(&y)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ord = compare_values(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(_), Value::Object(_)) => a.to_string().cmp(&b.to_string()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
