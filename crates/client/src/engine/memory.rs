//! In-memory engine for tests
//!
//! Stores documents per index and evaluates the subset of the query
//! language the composer emits: `term`, `terms`, `range` and `regexp`
//! clauses inside a `bool.must` group, plus `fields`, `size` and `sort`.
//! `_type` and `_id` are matchable like ordinary fields.

use super::{BulkAction, ScanIter, SearchEngine};
use esmeta_core::{compare_values, EngineError, Hit, Record, SearchResponse};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Page size when a search body has no `size`, as real engines do.
const ENGINE_DEFAULT_SIZE: usize = 10;

/// Number of calls made per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `index_exists` calls
    pub exists: usize,
    /// `index` calls
    pub index: usize,
    /// `search` calls
    pub search: usize,
    /// `bulk` calls
    pub bulk: usize,
    /// `scan` calls
    pub scan: usize,
}

#[derive(Debug, Clone)]
struct StoredDoc {
    id: String,
    doc_type: String,
    source: Record,
}

impl StoredDoc {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "_id" => Some(json!(self.id)),
            "_type" => Some(json!(self.doc_type)),
            _ => self.source.get(name).cloned(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    indices: BTreeMap<String, Vec<StoredDoc>>,
    calls: CallCounts,
    last_scan_batch: Option<usize>,
    failure: Option<String>,
}

/// Engine keeping documents in memory.
///
/// # Example
///
/// ```
/// use esmeta_client::{InMemoryEngine, SearchEngine};
/// use serde_json::json;
///
/// let engine = InMemoryEngine::new();
/// let doc = json!({"host_id": 5}).as_object().cloned().unwrap();
/// engine.index("metadata", "host_history", &doc).unwrap();
///
/// let body = json!({"query": {"bool": {"must": [{"term": {"host_id": 5}}]}}});
/// assert_eq!(engine.search("metadata", &body).unwrap().total(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    state: Mutex<State>,
    page_cap: Option<usize>,
}

impl InMemoryEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Never return more than `cap` hits from `search`, whatever the
    /// requested size. Simulates an engine-side result window.
    pub fn with_page_cap(mut self, cap: usize) -> Self {
        self.page_cap = Some(cap);
        self
    }

    /// Create `index` if it does not exist.
    pub fn create_index(&self, index: &str) {
        self.state.lock().indices.entry(index.to_string()).or_default();
    }

    /// Stored documents of `index`, in insertion order.
    pub fn documents(&self, index: &str) -> Vec<Record> {
        self.state
            .lock()
            .indices
            .get(index)
            .map(|docs| docs.iter().map(|d| d.source.clone()).collect())
            .unwrap_or_default()
    }

    /// Document types of `index`, in insertion order.
    pub fn doc_types(&self, index: &str) -> Vec<String> {
        self.state
            .lock()
            .indices
            .get(index)
            .map(|docs| docs.iter().map(|d| d.doc_type.clone()).collect())
            .unwrap_or_default()
    }

    /// Calls made so far.
    pub fn calls(&self) -> CallCounts {
        self.state.lock().calls
    }

    /// Batch size requested by the most recent scan.
    pub fn last_scan_batch(&self) -> Option<usize> {
        self.state.lock().last_scan_batch
    }

    /// Make every subsequent call fail with a network error (or stop
    /// failing with `None`).
    pub fn fail_with(&self, message: Option<&str>) {
        self.state.lock().failure = message.map(str::to_string);
    }

    fn check_failure(state: &State) -> Result<(), EngineError> {
        match &state.failure {
            Some(msg) => Err(EngineError::Network(msg.clone())),
            None => Ok(()),
        }
    }

    fn insert(state: &mut State, index: &str, doc_type: &str, id: Option<&str>, source: &Record) {
        let doc = StoredDoc {
            id: id
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            doc_type: doc_type.to_string(),
            source: source.clone(),
        };
        let docs = state.indices.entry(index.to_string()).or_default();
        match docs.iter_mut().find(|d| d.id == doc.id) {
            Some(existing) => *existing = doc,
            None => docs.push(doc),
        }
    }

    /// All matches of `body` in `index`, sorted if the body asks for it.
    fn matches(
        state: &State,
        index: &str,
        body: &Value,
    ) -> Result<Vec<StoredDoc>, EngineError> {
        let docs = state
            .indices
            .get(index)
            .ok_or_else(|| EngineError::IndexNotFound(index.to_string()))?;
        let clauses = must_clauses(body)?;
        let mut matched = Vec::new();
        for doc in docs {
            let mut keep = true;
            for clause in &clauses {
                if !clause_matches(clause, doc)? {
                    keep = false;
                    break;
                }
            }
            if keep {
                matched.push(doc.clone());
            }
        }
        if let Some(sort) = body.get("sort").and_then(Value::as_array) {
            let keys = sort_keys(sort);
            matched.sort_by(|a, b| compare_docs(a, b, &keys));
        }
        Ok(matched)
    }
}

fn must_clauses(body: &Value) -> Result<Vec<Value>, EngineError> {
    match body.pointer("/query/bool/must") {
        None => Ok(Vec::new()),
        Some(Value::Array(clauses)) => Ok(clauses.clone()),
        Some(other) => Err(EngineError::Status {
            status: 400,
            body: format!("must is not a list: {}", other),
        }),
    }
}

/// First (field, argument) pair of a clause body like `{"term": {f: v}}`.
fn clause_parts<'v>(clause: &'v Value, kind: &str) -> Option<(&'v str, &'v Value)> {
    clause
        .get(kind)
        .and_then(Value::as_object)
        .and_then(|o| o.iter().next())
        .map(|(k, v)| (k.as_str(), v))
}

/// Field values to test: arrays match element-wise.
fn candidates(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn clause_matches(clause: &Value, doc: &StoredDoc) -> Result<bool, EngineError> {
    if let Some((field, expected)) = clause_parts(clause, "term") {
        let Some(value) = doc.field(field) else {
            return Ok(false);
        };
        return Ok(candidates(&value)
            .into_iter()
            .any(|v| compare_values(v, expected) == Ordering::Equal));
    }
    if let Some((field, allowed)) = clause_parts(clause, "terms") {
        let Some(value) = doc.field(field) else {
            return Ok(false);
        };
        let allowed = allowed.as_array().cloned().unwrap_or_default();
        return Ok(candidates(&value).into_iter().any(|v| {
            allowed
                .iter()
                .any(|a| compare_values(v, a) == Ordering::Equal)
        }));
    }
    if let Some((field, bounds)) = clause_parts(clause, "range") {
        let Some(value) = doc.field(field) else {
            return Ok(false);
        };
        return Ok(candidates(&value).into_iter().any(|v| {
            let above = bounds
                .get("gte")
                .map_or(true, |low| compare_values(v, low) != Ordering::Less);
            let below = bounds
                .get("lte")
                .map_or(true, |high| compare_values(v, high) != Ordering::Greater);
            above && below
        }));
    }
    if let Some((field, pattern)) = clause_parts(clause, "regexp") {
        let pattern = pattern.as_str().unwrap_or_default();
        let regex = regex_lite::Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            EngineError::Status {
                status: 400,
                body: format!("invalid regexp '{}': {}", pattern, e),
            }
        })?;
        let Some(value) = doc.field(field) else {
            return Ok(false);
        };
        return Ok(candidates(&value)
            .into_iter()
            .any(|v| v.as_str().is_some_and(|s| regex.is_match(s))));
    }
    Err(EngineError::Status {
        status: 400,
        body: format!("unsupported clause: {}", clause),
    })
}

fn sort_keys(sort: &[Value]) -> Vec<(String, bool)> {
    sort.iter()
        .filter_map(|spec| match spec {
            Value::String(field) => Some((field.clone(), false)),
            Value::Object(o) => o
                .iter()
                .next()
                .map(|(field, dir)| (field.clone(), dir.as_str() == Some("desc"))),
            _ => None,
        })
        .collect()
}

fn compare_docs(a: &StoredDoc, b: &StoredDoc, keys: &[(String, bool)]) -> Ordering {
    for (field, desc) in keys {
        let left = a.field(field).unwrap_or(Value::Null);
        let right = b.field(field).unwrap_or(Value::Null);
        let ord = compare_values(&left, &right);
        let ord = if *desc { ord.reverse() } else { ord };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Render a stored document the way the engine returns it.
fn to_hit(index: &str, doc: StoredDoc, fields: Option<&Vec<Value>>) -> Hit {
    let mut hit = match fields {
        Some(fields) => {
            let mut projected = Record::new();
            for name in fields.iter().filter_map(Value::as_str) {
                if let Some(value) = doc.field(name) {
                    let list = match value {
                        Value::Array(items) => Value::Array(items),
                        other => Value::Array(vec![other]),
                    };
                    projected.insert(name.to_string(), list);
                }
            }
            Hit::from_fields(projected)
        }
        None => Hit::from_source(doc.source),
    };
    hit.index = Some(index.to_string());
    hit.doc_type = Some(doc.doc_type);
    hit.id = Some(doc.id);
    hit
}

impl SearchEngine for InMemoryEngine {
    fn index_exists(&self, index: &str) -> Result<bool, EngineError> {
        let mut state = self.state.lock();
        state.calls.exists += 1;
        Self::check_failure(&state)?;
        Ok(state.indices.contains_key(index))
    }

    fn index(&self, index: &str, doc_type: &str, document: &Record) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.calls.index += 1;
        Self::check_failure(&state)?;
        Self::insert(&mut state, index, doc_type, None, document);
        Ok(())
    }

    fn search(&self, index: &str, body: &Value) -> Result<SearchResponse, EngineError> {
        let mut state = self.state.lock();
        state.calls.search += 1;
        Self::check_failure(&state)?;
        let matched = Self::matches(&state, index, body)?;
        let total = matched.len() as u64;

        let mut size = body
            .get("size")
            .and_then(Value::as_u64)
            .map_or(ENGINE_DEFAULT_SIZE, |s| s as usize);
        if let Some(cap) = self.page_cap {
            size = size.min(cap);
        }
        let fields = body.get("fields").and_then(Value::as_array);
        let hits = matched
            .into_iter()
            .take(size)
            .map(|doc| to_hit(index, doc, fields))
            .collect();
        Ok(SearchResponse::new(total, hits))
    }

    fn bulk(&self, actions: &[BulkAction]) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.calls.bulk += 1;
        Self::check_failure(&state)?;
        for action in actions {
            Self::insert(
                &mut state,
                &action.index,
                &action.doc_type,
                action.id.as_deref(),
                &action.source,
            );
        }
        Ok(())
    }

    fn scan<'a>(
        &'a self,
        index: &str,
        body: &Value,
        batch_size: usize,
    ) -> Result<ScanIter<'a>, EngineError> {
        let mut state = self.state.lock();
        state.calls.scan += 1;
        state.last_scan_batch = Some(batch_size);
        Self::check_failure(&state)?;
        let matched = Self::matches(&state, index, body)?;
        let fields = body.get("fields").and_then(Value::as_array).cloned();
        let index = index.to_string();
        Ok(Box::new(matched.into_iter().map(move |doc| {
            Ok(to_hit(&index, doc, fields.as_ref()))
        })))
    }
}
