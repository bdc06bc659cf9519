//! Adaptive protocol negotiation against a vector-search backend whose routes
//! and payload field names are not known up front.
//!
//! The pieces, leaves first:
//!
//! - [`DocumentStore`] - process-lifetime id → text cache used to enrich results
//! - [`EndpointDiscoverer`] - ordered candidate tables plus one cached winner per operation
//! - [`RequestAdapter`] - renders a [`LogicalPayload`] into each candidate shape and
//!   sweeps candidates until the backend answers 2xx
//! - [`normalize`] - turns whatever the backend answered into [`SearchResultItem`]s
//!
//! Backend calls go through the [`BackendTransport`] trait. [`HttpTransport`]
//! talks to a real server; [`MemoryBackend`] is an in-process stand-in that
//! accepts exactly one dialect.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use negotiate::{EndpointDiscoverer, LogicalPayload, MemoryBackend, Operation, RequestAdapter};
//!
//! # async fn run() -> Result<(), negotiate::NegotiateError> {
//! let backend = Arc::new(MemoryBackend::new("docs", 3));
//! let adapter = RequestAdapter::new(
//!     backend,
//!     Arc::new(EndpointDiscoverer::standard()),
//!     "docs",
//!     Duration::from_secs(5),
//! );
//! let response = adapter.perform(Operation::Health, &LogicalPayload::Probe).await?;
//! println!("health answered on {}", response.endpoint_path());
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod candidate;
pub mod discovery;
pub mod error;
pub mod memory;
pub mod normalize;
pub mod operation;
pub mod payload;
pub mod store;
pub mod transport;

pub use crate::adapter::{AttemptOutcome, AttemptRecord, BackendResponse, RequestAdapter};
pub use crate::candidate::{
    CandidateCatalog, CandidateEndpoint, HttpMethod, PayloadShape, TopKField, VectorField,
};
pub use crate::discovery::{DiscoveredEndpoint, EndpointDiscoverer, PlannedAttempt, Resolution};
pub use crate::error::NegotiateError;
pub use crate::memory::{Dialect, MemoryBackend};
pub use crate::normalize::{normalize, ResponseShape, SearchResultItem};
pub use crate::operation::Operation;
pub use crate::payload::{LogicalPayload, ShapeMismatch};
pub use crate::store::{Document, DocumentStore, TextLookup};
pub use crate::transport::{
    BackendReply, BackendRequest, BackendTransport, HttpTransport, HttpTransportConfig,
    TransportError,
};
