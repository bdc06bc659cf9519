use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use smart_search::Document;
use std::sync::Arc;

/// Request to add a document
#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    /// Caller-chosen document id; re-using an id overwrites the document
    pub id: String,

    pub text: String,
}

/// Response from a successful add
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub success: bool,
    pub message: String,
    pub id: String,
    /// Backend route that accepted the vector
    pub endpoint_used: String,
}

/// Enrichment cache listing
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub count: usize,
    pub documents: Vec<Document>,
}

/// Embed a document and upsert it into the backend collection
pub async fn add_document(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<DocumentRequest>,
) -> ServerResult<Json<DocumentResponse>> {
    if request.id.trim().is_empty() {
        return Err(ServerError::BadRequest("id must not be empty".to_string()));
    }

    let service = Arc::clone(&state.service);
    let receipt = tokio::spawn(async move {
        service.add_document(&request.id, &request.text).await
    })
    .await??;

    Ok(Json(DocumentResponse {
        success: true,
        message: "Document added successfully".to_string(),
        id: receipt.id,
        endpoint_used: receipt.endpoint_used,
    }))
}

/// List documents added since startup
pub async fn list_documents(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let documents = state.service.documents();
    Json(DocumentListResponse {
        count: documents.len(),
        documents,
    })
}
