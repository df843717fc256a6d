//! Metadata client for Elasticsearch-compatible document stores
//!
//! This crate provides:
//! - MetadataClient: posting (single, bulk; HTTP or UDP) and querying
//! - Transparent scroll fallback when a query's first page is truncated
//! - SearchEngine trait with HTTP, no-op and in-memory implementations
//! - ClientConfig for connection settings
//!
//! # Usage
//!
//! ```ignore
//! use esmeta_client::{ClientConfig, MetadataClient, PostOptions, QueryBuilder};
//!
//! let client = MetadataClient::connect(ClientConfig::new("es.lab", 9200, "job_metadata"));
//! client.post("job", &record, &PostOptions::new());
//!
//! let result = client.query(QueryBuilder::new().equal("host_id", 5))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod engine;
pub mod fetch;
pub mod post;
pub mod udp;

pub use client::MetadataClient;
pub use config::{ClientConfig, EngineKind, Transport};
pub use engine::{BulkAction, CallCounts, HttpEngine, InMemoryEngine, NoopEngine, ScanIter, SearchEngine};
pub use post::PostOptions;
pub use udp::{udp_payload, UdpSender};

// Re-export the data model
pub use esmeta_core::*;
