//! Engine that does nothing

use super::{BulkAction, ScanIter, SearchEngine};
use esmeta_core::{EngineError, Record, SearchResponse};
use serde_json::Value;

/// Stand-in engine for runs without a reachable document store.
///
/// Writes succeed and are dropped. No index exists, so queries through the
/// client come back as "no result".
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEngine;

impl SearchEngine for NoopEngine {
    fn index_exists(&self, _index: &str) -> Result<bool, EngineError> {
        Ok(false)
    }

    fn index(&self, _index: &str, _doc_type: &str, _document: &Record) -> Result<(), EngineError> {
        Ok(())
    }

    fn search(&self, _index: &str, _body: &Value) -> Result<SearchResponse, EngineError> {
        Ok(SearchResponse::default())
    }

    fn bulk(&self, _actions: &[BulkAction]) -> Result<(), EngineError> {
        Ok(())
    }

    fn scan<'a>(
        &'a self,
        _index: &str,
        _body: &Value,
        _batch_size: usize,
    ) -> Result<ScanIter<'a>, EngineError> {
        Ok(Box::new(std::iter::empty()))
    }
}
