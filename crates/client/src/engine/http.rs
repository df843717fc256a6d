//! HTTP engine for Elasticsearch-compatible REST APIs
//!
//! | Operation | Request |
//! |-----------|---------|
//! | exists | `HEAD /{index}` |
//! | index | `POST /{index}/{type}` |
//! | search | `POST /{index}/_search` |
//! | bulk | `POST /_bulk` (NDJSON) |
//! | scan | `POST /{index}/_search?scroll=..`, then `POST /_search/scroll` |

use super::{BulkAction, ScanIter, SearchEngine};
use esmeta_core::{EngineError, Hit, Record, SearchResponse};
use serde_json::{json, Value};
use std::time::Duration;
use urlencoding::encode;

/// How long the engine keeps a scroll cursor alive between pages.
const SCROLL_KEEPALIVE: &str = "1m";

/// Upper bound on a single response body. Scroll pages can be large.
const MAX_RESPONSE_BYTES: u64 = 1 << 30;

/// Longest error body kept in an [`EngineError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Engine talking to a remote document store over HTTP.
pub struct HttpEngine {
    /// Base URL, e.g. "http://localhost:9200"
    base_url: String,
    /// Shared agent; carries the connection-level timeout
    agent: ureq::Agent,
}

impl std::fmt::Debug for HttpEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEngine")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpEngine {
    /// Create an engine for `base_url` with one timeout for every call.
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::Agent::new_with_config(config),
        }
    }

    /// Create an engine from client settings.
    pub fn from_config(config: &crate::ClientConfig) -> Self {
        Self::new(&config.base_url(), config.timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST a body and return the response text of a 2xx reply.
    fn post(&self, path: &str, content_type: &str, body: &[u8]) -> Result<String, EngineError> {
        let url = self.url(path);
        let mut response = self
            .agent
            .post(&url)
            .header("Content-Type", content_type)
            .send(body)
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .with_config()
            .limit(MAX_RESPONSE_BYTES)
            .read_to_string()
            .map_err(|e| EngineError::Network(format!("failed to read response: {}", e)))?;

        if !(200..300).contains(&status) {
            return Err(status_error(status, &text));
        }
        Ok(text)
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<Value, EngineError> {
        let bytes = serde_json::to_vec(body)?;
        let text = self.post(path, "application/json", &bytes)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn scroll_page(&self, scroll_id: &str) -> Result<SearchResponse, EngineError> {
        let body = json!({ "scroll": SCROLL_KEEPALIVE, "scroll_id": scroll_id });
        let reply = self.post_json("_search/scroll", &body)?;
        Ok(serde_json::from_value(reply)?)
    }

    fn clear_scroll(&self, scroll_id: &str) {
        let url = self.url(&format!("_search/scroll/{}", encode(scroll_id)));
        if let Err(e) = self.agent.delete(&url).call() {
            tracing::debug!(target: "esmeta::http", error = %e, "Failed to clear scroll");
        }
    }
}

fn transport_error(e: ureq::Error) -> EngineError {
    match e {
        ureq::Error::Timeout(_) => EngineError::Timeout,
        other => EngineError::Network(other.to_string()),
    }
}

fn status_error(status: u16, body: &str) -> EngineError {
    let mut body = body.to_string();
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    EngineError::Status { status, body }
}

/// `{index}/{type}`, each segment percent-encoded.
fn document_path(index: &str, doc_type: &str) -> String {
    format!("{}/{}", encode(index), encode(doc_type))
}

/// Build the NDJSON body of a bulk request.
pub fn bulk_body(actions: &[BulkAction]) -> Result<String, EngineError> {
    let mut body = String::new();
    for action in actions {
        body.push_str(&serde_json::to_string(&action.header())?);
        body.push('\n');
        body.push_str(&serde_json::to_string(&action.source)?);
        body.push('\n');
    }
    Ok(body)
}

/// Summarize per-item failures of a bulk reply, if any.
pub fn bulk_failures(reply: &Value) -> Option<String> {
    if !reply.get("errors").and_then(Value::as_bool).unwrap_or(false) {
        return None;
    }
    let items = reply.get("items").and_then(Value::as_array);
    let total = items.map_or(0, |items| items.len());
    let failed: Vec<&Value> = items
        .into_iter()
        .flatten()
        .filter_map(|item| item.as_object().and_then(|o| o.values().next()))
        .filter_map(|result| result.get("error"))
        .collect();
    let first = failed
        .first()
        .map(|e| {
            e.get("reason")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string())
        })
        .unwrap_or_else(|| "unknown error".to_string());
    Some(format!("{} of {} items failed: {}", failed.len(), total, first))
}

impl SearchEngine for HttpEngine {
    fn index_exists(&self, index: &str) -> Result<bool, EngineError> {
        let response = self
            .agent
            .head(&self.url(&encode(index)))
            .call()
            .map_err(transport_error)?;
        match response.status().as_u16() {
            200..=299 => Ok(true),
            404 => Ok(false),
            status => Err(status_error(status, "")),
        }
    }

    fn index(&self, index: &str, doc_type: &str, document: &Record) -> Result<(), EngineError> {
        let bytes = serde_json::to_vec(document)?;
        self.post(&document_path(index, doc_type), "application/json", &bytes)?;
        Ok(())
    }

    fn search(&self, index: &str, body: &Value) -> Result<SearchResponse, EngineError> {
        let reply = self.post_json(&format!("{}/_search", encode(index)), body)?;
        Ok(serde_json::from_value(reply)?)
    }

    fn bulk(&self, actions: &[BulkAction]) -> Result<(), EngineError> {
        if actions.is_empty() {
            return Ok(());
        }
        let body = bulk_body(actions)?;
        let text = self.post("_bulk", "application/x-ndjson", body.as_bytes())?;
        let reply: Value = serde_json::from_str(&text)?;
        match bulk_failures(&reply) {
            Some(summary) => Err(EngineError::Bulk(summary)),
            None => Ok(()),
        }
    }

    fn scan<'a>(
        &'a self,
        index: &str,
        body: &Value,
        batch_size: usize,
    ) -> Result<ScanIter<'a>, EngineError> {
        let mut body = body.clone();
        if let Some(obj) = body.as_object_mut() {
            obj.insert("size".to_string(), json!(batch_size));
            obj.entry("sort").or_insert_with(|| json!(["_doc"]));
        }
        let path = format!("{}/_search?scroll={}", encode(index), SCROLL_KEEPALIVE);
        let first: SearchResponse = serde_json::from_value(self.post_json(&path, &body)?)?;
        Ok(Box::new(ScrollIter::new(self, first)))
    }
}

/// Drains a scroll cursor page by page.
struct ScrollIter<'a> {
    engine: &'a HttpEngine,
    scroll_id: Option<String>,
    page: std::vec::IntoIter<Hit>,
    done: bool,
}

impl<'a> ScrollIter<'a> {
    fn new(engine: &'a HttpEngine, first: SearchResponse) -> Self {
        let done = first.hits.hits.is_empty();
        Self {
            engine,
            scroll_id: first.scroll_id,
            page: first.hits.hits.into_iter(),
            done,
        }
    }
}

impl Iterator for ScrollIter<'_> {
    type Item = Result<Hit, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(hit) = self.page.next() {
                return Some(Ok(hit));
            }
            if self.done {
                return None;
            }
            let Some(scroll_id) = self.scroll_id.clone() else {
                self.done = true;
                return None;
            };
            match self.engine.scroll_page(&scroll_id) {
                Ok(response) => {
                    if response.hits.hits.is_empty() {
                        self.done = true;
                    }
                    if response.scroll_id.is_some() {
                        self.scroll_id = response.scroll_id;
                    }
                    self.page = response.hits.hits.into_iter();
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl Drop for ScrollIter<'_> {
    fn drop(&mut self) {
        if let Some(scroll_id) = self.scroll_id.take() {
            self.engine.clear_scroll(&scroll_id);
        }
    }
}
