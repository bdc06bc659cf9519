//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all API endpoints
//! - Middleware stack (request ids, logging, timeouts, compression, CORS)
//! - Backend bootstrap before the listener opens
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::middleware::{log_requests, request_id};
use crate::routes::{api_info, not_found};
use crate::routes::{discovery, documents, health, search};
use crate::state::ServerState;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Middleware stack (outermost first):
/// 1. HTTP tracing
/// 2. Request ID tracking
/// 3. Request logging
/// 4. CORS
/// 5. Compression
/// 6. Timeout handling
/// 7. Body size limit
pub fn build_router(state: Arc<ServerState>) -> Router {
    // CORS layer
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    // Never cut off a request while its discovery sweep can still succeed.
    let request_timeout = state.config.timeout().max(state.service.worst_case_call());

    let api_routes = Router::new()
        .route("/api", get(api_info))
        .route("/api/health", get(health::health_check))
        .route(
            "/api/documents",
            post(documents::add_document).get(documents::list_documents),
        )
        .route("/api/search", post(search::search_documents))
        .route("/api/discovery", get(discovery::discovered_endpoints));

    Router::new()
        .route_service("/", ServeFile::new(state.config.index_file()))
        .merge(api_routes)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the smart-search HTTP server
///
/// Initializes logging, builds the service context, probes the backend and
/// starts listening. Blocks until SIGTERM or Ctrl+C.
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
///
/// # Degraded start
///
/// An unreachable backend does not stop the server. `/api/health` reports
/// `unavailable` and document or search requests answer 503 until a later
/// probe succeeds.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    let state = Arc::new(ServerState::new(config.clone())?);

    match state.service.bootstrap().await {
        Ok(report) => tracing::info!(
            collection = %report.collection,
            endpoint = ?report.endpoint,
            collections = ?report.collections,
            "backend ready"
        ),
        Err(err) => tracing::warn!(
            error = %err,
            "backend unavailable, starting in degraded mode"
        ),
    }

    let request_timeout = config.timeout().max(state.service.worst_case_call());
    let app = build_router(state);
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        addr = %addr,
        backend_mode = ?config.service.backend.mode,
        base_url = %config.service.backend.base_url,
        collection = %config.service.collection,
        "Starting smart-search server"
    );
    tracing::info!(
        "Timeout: {}s, Max body: {}MB, CORS: {}",
        request_timeout.as_secs(),
        config.max_body_size_mb,
        config.enable_cors
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
