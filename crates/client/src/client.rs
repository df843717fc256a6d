//! The metadata client
//!
//! Query entry points live in `fetch.rs`, posting in `post.rs`.

use std::sync::Arc;

use crate::config::{ClientConfig, EngineKind};
use crate::engine::{HttpEngine, NoopEngine, SearchEngine};
use crate::udp::UdpSender;

/// Posts metadata to, and queries it from, one index of a document store.
///
/// The engine handle is injected; the client never opens connections of its
/// own except for UDP posting. Calls block until the round trip (or, for a
/// scroll, the whole drain) completes.
///
/// # Example
///
/// ```
/// use esmeta_client::{ClientConfig, EngineKind, MetadataClient, QueryBuilder};
///
/// let config = ClientConfig::default().with_engine(EngineKind::Noop);
/// let client = MetadataClient::connect(config);
///
/// let result = client.query(QueryBuilder::new().equal("host_id", 5)).unwrap();
/// assert!(result.is_none());
/// ```
pub struct MetadataClient {
    pub(crate) config: ClientConfig,
    pub(crate) engine: Arc<dyn SearchEngine>,
    pub(crate) udp: UdpSender,
}

impl std::fmt::Debug for MetadataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MetadataClient {
    /// Create a client over an existing engine handle.
    pub fn new(config: ClientConfig, engine: Arc<dyn SearchEngine>) -> Self {
        let udp = UdpSender::new(config.host.clone(), config.udp_port);
        Self {
            config,
            engine,
            udp,
        }
    }

    /// Create a client with the engine selected by `config.engine`.
    pub fn connect(config: ClientConfig) -> Self {
        let engine: Arc<dyn SearchEngine> = match config.engine {
            EngineKind::Http => Arc::new(HttpEngine::from_config(&config)),
            EngineKind::Noop => Arc::new(NoopEngine),
        };
        Self::new(config, engine)
    }

    /// Client settings.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Index this client reads and writes.
    pub fn index(&self) -> &str {
        &self.config.index
    }

    /// The engine handle.
    pub fn engine(&self) -> &Arc<dyn SearchEngine> {
        &self.engine
    }
}
