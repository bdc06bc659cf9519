//! API route handlers
//!
//! - `health`: backend health probe and server metadata
//! - `documents`: add documents and list the enrichment cache
//! - `search`: text search
//! - `discovery`: currently cached backend endpoints
//!
//! Handlers that talk to the backend spawn that work onto the runtime, so a
//! client that disconnects does not cancel an in-flight insert or search.

pub mod discovery;
pub mod documents;
pub mod health;
pub mod search;

use crate::error::{ServerError, ServerResult};
use crate::state::{ServerMetadata, ServerState};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// API version and base info
///
/// # Response
///
/// ```json
/// {
///   "name": "Smart Search",
///   "version": "0.1.0",
///   "metadata": { "uptime_seconds": 12, "collection": "smart_search", "dimension": 384 },
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let service = state.service.config();
    let metadata = ServerMetadata {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: health::uptime_seconds(),
        collection: service.collection.clone(),
        dimension: service.dimension,
    };

    Ok(Json(json!({
        "name": "Smart Search",
        "version": env!("CARGO_PKG_VERSION"),
        "metadata": metadata,
        "endpoints": [
            "GET /api/health",
            "POST /api/documents",
            "GET /api/documents",
            "POST /api/search",
            "GET /api/discovery",
            "GET /"
        ]
    })))
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
