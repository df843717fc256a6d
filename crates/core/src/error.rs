//! Error types for esmeta
//!
//! Two families live here:
//! - [`EngineError`]: everything the document store (or the transport to it)
//!   can throw. It is the only error family recognized from the engine.
//! - [`Error`]: what callers of the query path see.
//!
//! Posting never surfaces either type; failures are logged and reported as
//! `false` by the poster.

use thiserror::Error;

/// Result type alias for esmeta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by a search engine implementation
#[derive(Debug, Error)]
pub enum EngineError {
    /// Connection refused, DNS failure, broken socket, ...
    #[error("network error: {0}")]
    Network(String),

    /// The connection-level timeout elapsed
    #[error("engine request timed out")]
    Timeout,

    /// The engine answered with a non-success HTTP status
    #[error("engine returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// The addressed index does not exist
    #[error("index not found: {0}")]
    IndexNotFound(String),

    /// One or more items of a bulk request failed
    #[error("bulk request failed: {0}")]
    Bulk(String),

    /// The engine's reply could not be understood
    #[error("malformed engine response: {0}")]
    Response(String),
}

impl EngineError {
    /// Returns true if this error means the index is missing.
    pub fn is_index_not_found(&self) -> bool {
        match self {
            EngineError::IndexNotFound(_) => true,
            EngineError::Status { status, body } => {
                *status == 404 && body.contains("index_not_found")
            }
            _ => false,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Response(e.to_string())
    }
}

/// Errors visible to callers of the query API
#[derive(Debug, Error)]
pub enum Error {
    /// The query has no usable equality or range constraint
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Scroll retrieval was asked to honor a sort it cannot reproduce
    #[error("unsupported sort for scroll retrieval: {0}")]
    UnsupportedSort(String),

    /// Engine or transport failure
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl Error {
    /// Shorthand for [`Error::InvalidQuery`].
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Error::InvalidQuery(msg.into())
    }
}
