//! Workspace umbrella crate for smart-search.
//!
//! This crate stitches the deterministic embedder and the backend negotiation
//! layer into a single [`SearchService`] so callers can add documents and run
//! text searches against a vector backend whose routes and payload shapes are
//! discovered at runtime.
//!
//! ```no_run
//! use smart_search::{SearchService, ServiceConfig};
//!
//! # async fn run() -> Result<(), smart_search::ServiceError> {
//! let service = SearchService::new(ServiceConfig::memory())?;
//! service.bootstrap().await?;
//! service.add_document("doc1", "hello world").await?;
//! let outcome = service.search("hello world", 1).await?;
//! assert_eq!(outcome.results[0].id, "doc1");
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
mod service;

pub use config::{BackendMode, BackendSettings, ConfigLoadError, ServiceConfig};
pub use error::ServiceError;
pub use service::{HealthReport, InsertReceipt, SearchOutcome, SearchService};

pub use embed::{EmbeddingGenerator, EmbeddingVector, embed};
pub use negotiate::{
    AttemptOutcome, AttemptRecord, BackendTransport, DiscoveredEndpoint, Document,
    MemoryBackend, Operation, SearchResultItem,
};
