//! Client configuration
//!
//! Every connection parameter is a constructor input owned by the calling
//! application. `ClientConfig` deserializes with per-field defaults so an
//! application can embed it in its own config format.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How single records are posted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// One index call per record
    #[default]
    Http,
    /// One fire-and-forget datagram per record
    Udp,
}

/// Which engine implementation `MetadataClient::connect` builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Talk to a real engine over HTTP
    #[default]
    Http,
    /// Accept every post, answer every query with "no index"
    Noop,
}

/// Connection settings for a metadata client.
///
/// # Example
///
/// ```
/// use esmeta_client::{ClientConfig, Transport};
///
/// let config: ClientConfig = serde_json::from_str(
///     r#"{ "host": "es.lab", "index": "job_metadata", "transport": "udp" }"#,
/// ).unwrap();
/// assert_eq!(config.port, 9200);
/// assert_eq!(config.transport, Transport::Udp);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Engine host name or address
    #[serde(default = "default_host")]
    pub host: String,
    /// Engine HTTP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Index metadata is stored in and queried from
    #[serde(default = "default_index")]
    pub index: String,
    /// Port of the engine's UDP bulk listener
    #[serde(default = "default_udp_port")]
    pub udp_port: u16,
    /// Timeout applied to every HTTP call, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Transport for single-record posts
    #[serde(default)]
    pub transport: Transport,
    /// Engine implementation
    #[serde(default)]
    pub engine: EngineKind,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    9200
}

fn default_index() -> String {
    "metadata".to_string()
}

fn default_udp_port() -> u16 {
    9700
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            index: default_index(),
            udp_port: default_udp_port(),
            timeout_ms: default_timeout_ms(),
            transport: Transport::default(),
            engine: EngineKind::default(),
        }
    }
}

impl ClientConfig {
    /// Config for `host:port` storing into `index`.
    pub fn new(host: impl Into<String>, port: u16, index: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            index: index.into(),
            ..Self::default()
        }
    }

    /// Set the UDP port.
    pub fn with_udp_port(mut self, udp_port: u16) -> Self {
        self.udp_port = udp_port;
        self
    }

    /// Set the connection timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the single-record transport.
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Set the engine implementation.
    pub fn with_engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    /// Connection timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Base URL of the engine's HTTP API.
    ///
    /// A host that already carries a scheme is used as is.
    pub fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}", self.host.trim_end_matches('/'), self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}
