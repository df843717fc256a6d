//! Search engine collaborator
//!
//! The client never talks to the document store directly; it goes through
//! the [`SearchEngine`] trait. Every failure an implementation reports is an
//! [`EngineError`].
//!
//! # Implementations
//!
//! - [`HttpEngine`]: Elasticsearch-compatible REST API over `ureq`
//! - [`NoopEngine`]: accepts writes, has no indices
//! - [`InMemoryEngine`]: evaluates composed queries over stored documents,
//!   for tests

pub mod http;
pub mod memory;
pub mod noop;

pub use http::HttpEngine;
pub use memory::{CallCounts, InMemoryEngine};
pub use noop::NoopEngine;

use esmeta_core::{
    EngineError, Hit, Record, SearchResponse, DEFAULT_DOC_TYPE, ID_FIELD, INDEX_FIELD, TYPE_FIELD,
};
use serde_json::{json, Value};

/// Lazy sequence of hits produced by a scan. It drains once.
pub type ScanIter<'a> = Box<dyn Iterator<Item = Result<Hit, EngineError>> + 'a>;

/// One index action of a bulk request
#[derive(Debug, Clone, PartialEq)]
pub struct BulkAction {
    /// Destination index
    pub index: String,
    /// Document type
    pub doc_type: String,
    /// Document id; the engine assigns one when absent
    pub id: Option<String>,
    /// Document body
    pub source: Record,
}

impl BulkAction {
    /// Split a record into action metadata and body.
    ///
    /// `_index`, `_type` and `_id` are removed from the record and become
    /// the action's metadata. `default_index` applies when `_index` is
    /// absent.
    pub fn from_record(mut record: Record, default_index: &str) -> Self {
        let index = take_string(&mut record, INDEX_FIELD).unwrap_or_else(|| default_index.into());
        let doc_type =
            take_string(&mut record, TYPE_FIELD).unwrap_or_else(|| DEFAULT_DOC_TYPE.to_string());
        let id = take_string(&mut record, ID_FIELD);
        Self {
            index,
            doc_type,
            id,
            source: record,
        }
    }

    /// The action line of the bulk body.
    pub fn header(&self) -> Value {
        let mut meta = json!({ "_index": self.index, "_type": self.doc_type });
        if let Some(id) = &self.id {
            meta["_id"] = json!(id);
        }
        json!({ "index": meta })
    }
}

fn take_string(record: &mut Record, key: &str) -> Option<String> {
    record.remove(key).map(|v| match v {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Operations the client needs from a document store.
///
/// Object-safe; the client holds an `Arc<dyn SearchEngine>`.
pub trait SearchEngine: Send + Sync {
    /// Whether `index` exists.
    fn index_exists(&self, index: &str) -> Result<bool, EngineError>;

    /// Store one document.
    fn index(&self, index: &str, doc_type: &str, document: &Record) -> Result<(), EngineError>;

    /// Run a query document against `index`.
    fn search(&self, index: &str, body: &Value) -> Result<SearchResponse, EngineError>;

    /// Store many documents in one request.
    fn bulk(&self, actions: &[BulkAction]) -> Result<(), EngineError>;

    /// Stream every match of `body`, fetching `batch_size` hits per round
    /// trip. Hits come back in no particular order.
    fn scan<'a>(
        &'a self,
        index: &str,
        body: &Value,
        batch_size: usize,
    ) -> Result<ScanIter<'a>, EngineError>;
}
