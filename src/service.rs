use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use embed::EmbeddingGenerator;
use negotiate::{
    AttemptOutcome, AttemptRecord, BackendTransport, DiscoveredEndpoint, Document, DocumentStore, EndpointDiscoverer,
    HttpTransport, HttpTransportConfig, LogicalPayload, MemoryBackend, Operation, RequestAdapter,
    SearchResultItem, normalize,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{BackendMode, ServiceConfig};
use crate::error::ServiceError;

/// Backend readiness as seen by the last health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// `healthy` or `unavailable`
    pub status: &'static str,
    /// `connected` or `unreachable`
    pub backend: &'static str,
    pub collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// A document accepted by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertReceipt {
    pub id: String,
    pub endpoint_used: String,
}

/// Normalized search hits in backend rank order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub query: String,
    pub results: Vec<SearchResultItem>,
    pub endpoint_used: String,
}

/// Service context shared by every request: embedding, endpoint negotiation
/// and the text enrichment cache.
///
/// Built once at startup. All methods take `&self` and are safe to call from
/// concurrent requests.
pub struct SearchService {
    config: ServiceConfig,
    embedder: EmbeddingGenerator,
    adapter: RequestAdapter,
    store: DocumentStore,
    ready: AtomicBool,
    collection_ready: AtomicBool,
}

impl SearchService {
    /// Builds the transport selected by `config.backend.mode`.
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        config.validate()?;
        let transport: Arc<dyn BackendTransport> = match config.backend.mode {
            BackendMode::Http => Arc::new(HttpTransport::new(HttpTransportConfig {
                base_url: config.backend.base_url.clone(),
                username: config.backend.username.clone(),
                password: config.backend.password.clone(),
                accept_invalid_certs: config.backend.accept_invalid_certs,
                ..HttpTransportConfig::default()
            })?),
            BackendMode::Memory => Arc::new(MemoryBackend::new(
                config.collection.clone(),
                config.dimension,
            )),
        };
        Self::with_transport(config, transport)
    }

    /// Uses `transport` regardless of the configured mode.
    pub fn with_transport(
        config: ServiceConfig,
        transport: Arc<dyn BackendTransport>,
    ) -> Result<Self, ServiceError> {
        config.validate()?;
        let adapter = RequestAdapter::new(
            transport,
            Arc::new(EndpointDiscoverer::standard()),
            config.collection.clone(),
            config.backend.attempt_timeout(),
        );
        Ok(Self {
            embedder: EmbeddingGenerator::new(config.dimension),
            adapter,
            store: DocumentStore::new(),
            ready: AtomicBool::new(false),
            collection_ready: AtomicBool::new(false),
            config,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Probes the backend and, when configured, creates the collection.
    ///
    /// An unreachable backend or a collection that could not be created leaves
    /// the service degraded; later document and search calls bootstrap again
    /// before giving up.
    pub async fn bootstrap(&self) -> Result<HealthReport, ServiceError> {
        let report = self.health().await;
        if report.is_healthy() {
            return Ok(report);
        }
        if report.backend != "connected" || !self.config.ensure_collection {
            return Err(not_ready(report));
        }

        self.create_collection().await?;
        self.collection_ready.store(true, Ordering::Release);
        self.ready.store(true, Ordering::Release);
        Ok(HealthReport {
            status: "healthy",
            detail: None,
            ..report
        })
    }

    /// Probes the backend's health endpoint and updates readiness.
    ///
    /// The service is ready only when the backend answers and the configured
    /// collection is known to exist.
    pub async fn health(&self) -> HealthReport {
        let collection = self.config.collection.clone();
        match self
            .adapter
            .perform(Operation::Health, &LogicalPayload::Probe)
            .await
        {
            Ok(response) => {
                let listed = lists_collection(&response.body, &collection);
                let initialized = listed == Some(true)
                    || self.collection_ready.load(Ordering::Acquire)
                    || (!self.config.ensure_collection && listed != Some(false));
                if initialized {
                    self.collection_ready.store(true, Ordering::Release);
                }
                self.set_ready(initialized, "collection not initialized");

                HealthReport {
                    status: if initialized { "healthy" } else { "unavailable" },
                    backend: "connected",
                    collections: count_collections(&response.body),
                    endpoint: Some(response.endpoint_path().to_string()),
                    detail: (!initialized)
                        .then(|| format!("collection {collection} not initialized")),
                    collection,
                }
            }
            Err(err) => {
                self.set_ready(false, "backend became unavailable");
                HealthReport {
                    status: "unavailable",
                    backend: "unreachable",
                    collection,
                    collections: None,
                    endpoint: None,
                    detail: Some(err.to_string()),
                }
            }
        }
    }

    /// Embeds `text`, writes it to the backend and remembers it for enrichment.
    pub async fn add_document(&self, id: &str, text: &str) -> Result<InsertReceipt, ServiceError> {
        if id.trim().is_empty() {
            return Err(ServiceError::Validation("id must not be empty".into()));
        }
        self.ensure_ready().await?;

        let payload = LogicalPayload::Insert {
            id: id.to_string(),
            vector: self.embedder.generate(text),
            text: text.to_string(),
        };
        let response = self.adapter.perform(Operation::Insert, &payload).await?;
        self.store.put(id, text);

        info!(id, route = %response.endpoint_path(), "document stored");
        Ok(InsertReceipt {
            id: id.to_string(),
            endpoint_used: response.endpoint_path().to_string(),
        })
    }

    /// Embeds `query` and returns up to `top_k` normalized hits.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<SearchOutcome, ServiceError> {
        if query.trim().is_empty() {
            return Err(ServiceError::Validation("query must not be empty".into()));
        }
        if top_k == 0 {
            return Err(ServiceError::Validation("top_k must be >= 1".into()));
        }
        self.ensure_ready().await?;

        let payload = LogicalPayload::Search {
            vector: self.embedder.generate(query),
            top_k,
        };
        let response = self.adapter.perform(Operation::Search, &payload).await?;
        let endpoint_used = response.endpoint_path().to_string();
        let results = normalize(response.body, &self.store);

        debug!(top_k, hits = results.len(), route = %endpoint_used, "search finished");
        Ok(SearchOutcome {
            query: query.to_string(),
            results,
            endpoint_used,
        })
    }

    /// Enrichment cache contents in insertion order.
    pub fn documents(&self) -> Vec<Document> {
        self.store.list()
    }

    pub fn discovered_endpoints(&self) -> Vec<DiscoveredEndpoint> {
        self.adapter.discoverer().snapshot()
    }

    /// Upper bound on backend time for one document or search call when every
    /// attempt times out: a health sweep, a collection sweep, then the longer
    /// of the insert and search sweeps, each led by a cached endpoint.
    pub fn worst_case_call(&self) -> Duration {
        let discoverer = self.adapter.discoverer();
        let sweep = |operation| discoverer.candidates(operation).len() as u32 + 1;
        let attempts = sweep(Operation::Health)
            + sweep(Operation::CreateCollection)
            + sweep(Operation::Insert).max(sweep(Operation::Search));
        self.config.backend.attempt_timeout() * attempts
    }

    async fn ensure_ready(&self) -> Result<(), ServiceError> {
        if self.is_ready() {
            return Ok(());
        }
        let report = self.bootstrap().await?;
        info!(collection = %report.collection, "backend available again");
        Ok(())
    }

    /// A 409 from any collection route counts as "already exists".
    async fn create_collection(&self) -> Result<(), ServiceError> {
        let payload = LogicalPayload::Collection {
            name: self.config.collection.clone(),
            dimension: self.config.dimension,
            description: self.config.description.clone(),
        };
        match self
            .adapter
            .perform(Operation::CreateCollection, &payload)
            .await
        {
            Ok(response) => {
                info!(
                    collection = %self.config.collection,
                    dimension = self.config.dimension,
                    route = %response.endpoint_path(),
                    "collection created"
                );
                Ok(())
            }
            Err(err) if already_exists(err.attempts()) => {
                info!(collection = %self.config.collection, "collection already exists");
                Ok(())
            }
            Err(err) => {
                warn!(
                    collection = %self.config.collection,
                    error = %err,
                    "collection not initialized"
                );
                Err(ServiceError::Configuration(format!(
                    "collection {} not initialized: {err}",
                    self.config.collection
                )))
            }
        }
    }

    fn set_ready(&self, ready: bool, reason: &str) {
        if self.ready.swap(ready, Ordering::AcqRel) && !ready {
            warn!(collection = %self.config.collection, "{reason}");
        }
    }
}

fn not_ready(report: HealthReport) -> ServiceError {
    ServiceError::Configuration(
        report
            .detail
            .unwrap_or_else(|| "backend unreachable".to_string()),
    )
}

fn already_exists(attempts: &[AttemptRecord]) -> bool {
    attempts
        .iter()
        .any(|attempt| attempt.outcome == AttemptOutcome::Status(409))
}

/// `Some(true)` when a collection listing names `collection`, `None` when the
/// body carries no names at all.
fn lists_collection(body: &Value, collection: &str) -> Option<bool> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(map) => map.get("collections").and_then(Value::as_array)?,
        _ => return None,
    };
    let names: Vec<&str> = items
        .iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(name.as_str()),
            Value::Object(entry) => entry
                .get("name")
                .or_else(|| entry.get("id"))
                .and_then(Value::as_str),
            _ => None,
        })
        .collect();
    if names.is_empty() && !items.is_empty() {
        return None;
    }
    Some(names.contains(&collection))
}

fn count_collections(body: &Value) -> Option<usize> {
    match body {
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => map
            .get("collections")
            .and_then(Value::as_array)
            .map(Vec::len),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collection_count_from_array_or_mapping() {
        assert_eq!(count_collections(&json!([{"name": "a"}, {"name": "b"}])), Some(2));
        assert_eq!(count_collections(&json!({"collections": []})), Some(0));
        assert_eq!(count_collections(&json!({"status": "ok"})), None);
        assert_eq!(count_collections(&Value::Null), None);
    }

    #[test]
    fn collection_listing_names_entries() {
        assert_eq!(lists_collection(&json!([{"name": "docs"}]), "docs"), Some(true));
        assert_eq!(lists_collection(&json!(["other"]), "docs"), Some(false));
        assert_eq!(lists_collection(&json!({"collections": []}), "docs"), Some(false));
        assert_eq!(lists_collection(&json!([{"size": 3}]), "docs"), None);
        assert_eq!(lists_collection(&json!({"status": "ok"}), "docs"), None);
    }

    #[test]
    fn conflict_status_means_collection_exists() {
        let attempt = |outcome| AttemptRecord {
            method: negotiate::HttpMethod::Post,
            route: "/collections".into(),
            shape: negotiate::PayloadShape::CollectionSpec,
            from_cache: false,
            outcome,
        };
        assert!(already_exists(&[
            attempt(AttemptOutcome::Status(404)),
            attempt(AttemptOutcome::Status(409)),
        ]));
        assert!(!already_exists(&[attempt(AttemptOutcome::Status(500))]));
        assert!(!already_exists(&[]));
    }

    #[test]
    fn worst_case_call_covers_every_sweep() {
        let service = SearchService::new(ServiceConfig::memory()).unwrap();
        let per_attempt = service.config().backend.attempt_timeout();
        // health 5+1, create 5+1, insert 12+1
        assert_eq!(service.worst_case_call(), per_attempt * 25);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ServiceConfig {
            dimension: 0,
            ..ServiceConfig::memory()
        };
        assert!(matches!(
            SearchService::new(config),
            Err(ServiceError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn fresh_service_is_not_ready_until_probed() {
        let service = SearchService::new(ServiceConfig::memory()).unwrap();
        assert!(!service.is_ready());

        let report = service.health().await;
        assert!(report.is_healthy());
        assert_eq!(report.collections, Some(1));
        assert_eq!(report.endpoint.as_deref(), Some("/api/v1/collections"));
        assert!(service.is_ready());
    }

    #[tokio::test]
    async fn validation_happens_before_backend_calls() {
        let service = SearchService::new(ServiceConfig::memory()).unwrap();
        assert!(matches!(
            service.add_document(" ", "text").await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.search("", 3).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.search("hello", 0).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(service.discovered_endpoints().is_empty());
    }
}
