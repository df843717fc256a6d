//! Core types for esmeta
//!
//! This crate defines the data model shared by the client:
//! - Constraint, SortSpec, QueryBuilder, QueryDocument: query composition
//! - Hit, SearchResponse, QueryResult: engine responses and normalized output
//! - Record plus the reserved metadata field names
//! - Error, EngineError: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod hit;
pub mod query;
pub mod record;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::{EngineError, Error, Result};
pub use hit::{compare_values, Hit, HitsEnvelope, QueryResult, SearchResponse, TotalHits};
pub use query::{
    Constraint, QueryBuilder, QueryDocument, SortOrder, SortSpec, DEFAULT_RESULT_SIZE,
    DEFAULT_SCROLL_SIZE,
};
pub use record::{
    epoch_seconds, merge_fields, stamp_time_recorded, Record, DEFAULT_DOC_TYPE, ID_FIELD,
    INDEX_FIELD, TIME_RECORDED_FIELD, TYPE_FIELD,
};
