use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use smart_search::HealthReport;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

pub(crate) fn uptime_seconds() -> u64 {
    SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    #[serde(flatten)]
    pub report: HealthReport,
    pub service: &'static str,
    pub timestamp: String,
    pub uptime_seconds: u64,
}

/// Backend health probe
///
/// 200 when the backend answered a health candidate, 503 otherwise. The body
/// has the same shape either way.
pub async fn health_check(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let service = Arc::clone(&state.service);
    let report = tokio::spawn(async move { service.health().await }).await?;

    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    Ok((
        status,
        Json(HealthResponse {
            report,
            service: "smart-search",
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: uptime_seconds(),
        }),
    ))
}
