use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use smart_search::SearchResultItem;
use std::sync::Arc;

/// Search request
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,

    /// Number of results to return
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Search response
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub results: Vec<SearchResultItem>,
    pub query: String,
    pub endpoint_used: String,
}

fn default_top_k() -> usize {
    5
}

/// Embed the query and return normalized nearest neighbors
pub async fn search_documents(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<SearchRequest>,
) -> ServerResult<Json<SearchResponse>> {
    if request.query.trim().is_empty() {
        return Err(ServerError::BadRequest("query must not be empty".to_string()));
    }

    let max_top_k = state.config.max_top_k;
    if request.top_k == 0 || request.top_k > max_top_k {
        return Err(ServerError::BadRequest(format!(
            "top_k must be between 1 and {max_top_k}"
        )));
    }

    let service = Arc::clone(&state.service);
    let outcome = tokio::spawn(async move {
        service.search(&request.query, request.top_k).await
    })
    .await??;

    Ok(Json(SearchResponse {
        success: true,
        results: outcome.results,
        query: outcome.query,
        endpoint_used: outcome.endpoint_used,
    }))
}
