use crate::state::ServerState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use smart_search::DiscoveredEndpoint;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub ready: bool,
    pub endpoints: Vec<DiscoveredEndpoint>,
}

/// Backend endpoints confirmed so far, one per operation at most
pub async fn discovered_endpoints(State(state): State<Arc<ServerState>>) -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        ready: state.service.is_ready(),
        endpoints: state.service.discovered_endpoints(),
    })
}
