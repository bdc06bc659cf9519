use crate::config::ServerConfig;
use crate::error::ServerResult;
use smart_search::SearchService;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Service context shared across requests
    pub service: Arc<SearchService>,
}

impl ServerState {
    /// Create new server state with the backend selected by the config
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let service = SearchService::new(config.service.clone())?;
        Ok(Self::with_service(config, Arc::new(service)))
    }

    /// Wrap an already built service
    pub fn with_service(config: ServerConfig, service: Arc<SearchService>) -> Self {
        Self {
            config: Arc::new(config),
            service,
        }
    }
}

/// Server metadata for the API info endpoint
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
    pub collection: String,
    pub dimension: usize,
}
