//! esmeta - metadata reporting and query client for Elasticsearch-compatible stores
//!
//! esmeta posts metadata records (singly or in bulk, over HTTP or UDP) to a
//! document store index and queries them back through a small typed
//! constraint language.
//!
//! # Quick Start
//!
//! ```ignore
//! use esmeta::{ClientConfig, MetadataClient, PostOptions, QueryBuilder, SortOrder};
//!
//! let client = MetadataClient::connect(ClientConfig::new("es.lab", 9200, "job_metadata"));
//!
//! // Report a record; failures come back as `false`, never as errors
//! client.post("job", &record, &PostOptions::new());
//!
//! // Query it back; truncated pages are completed through a scroll
//! let result = client.query(
//!     QueryBuilder::new()
//!         .equal("host_id", 5)
//!         .between("time_recorded", start, end)
//!         .sort("time_recorded", SortOrder::Desc),
//! )?;
//! ```
//!
//! # Architecture
//!
//! The data model (constraints, query documents, hits, errors) lives in
//! `esmeta-core`; the client, its engines and transports in `esmeta-client`.
//! Both are re-exported here.

// Re-export the public API from esmeta-client
pub use esmeta_client::*;
