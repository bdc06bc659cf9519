//! HTTP tests for the smart-search API, driven in-process against an
//! in-memory vector backend.

use std::io::Write;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use server::routes::documents::{DocumentListResponse, DocumentResponse};
use server::routes::search::SearchResponse;
use server::{build_router, ServerConfig, ServerState};
use smart_search::{BackendTransport, MemoryBackend, SearchService, ServiceConfig};
use tower::ServiceExt;

const COLLECTION: &str = "docs";
const DIMENSION: usize = 64;

fn test_config() -> ServerConfig {
    ServerConfig {
        max_top_k: 10,
        service: ServiceConfig {
            collection: COLLECTION.to_string(),
            dimension: DIMENSION,
            ..ServiceConfig::memory()
        },
        ..ServerConfig::default()
    }
}

fn test_app(backend: &Arc<MemoryBackend>, config: ServerConfig) -> Router {
    let service = SearchService::with_transport(
        config.service.clone(),
        Arc::clone(backend) as Arc<dyn BackendTransport>,
    )
    .unwrap();
    build_router(Arc::new(ServerState::with_service(config, Arc::new(service))))
}

fn memory_app() -> (Arc<MemoryBackend>, Router) {
    let backend = Arc::new(MemoryBackend::new(COLLECTION, DIMENSION));
    let app = test_app(&backend, test_config());
    (backend, app)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn add_then_search_returns_the_document_with_text() {
    let (_backend, app) = memory_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/documents",
        Some(json!({"id": "doc1", "text": "hello world"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let added: DocumentResponse = serde_json::from_value(body).unwrap();
    assert!(added.success);
    assert_eq!(added.id, "doc1");
    assert_eq!(added.endpoint_used, "/api/v1/collections/docs/vectors");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({"query": "hello world", "top_k": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let found: SearchResponse = serde_json::from_value(body).unwrap();
    assert!(found.success);
    assert_eq!(found.query, "hello world");
    assert_eq!(found.results.len(), 1);
    assert_eq!(found.results[0].id, "doc1");
    assert_eq!(found.results[0].text, "hello world");
}

#[tokio::test]
async fn document_listing_reflects_inserts() {
    let (_backend, app) = memory_app();
    for (id, text) in [("a", "alpha"), ("b", "beta"), ("a", "alpha again")] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/documents",
            Some(json!({"id": id, "text": text})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, Method::GET, "/api/documents", None).await;
    assert_eq!(status, StatusCode::OK);
    let listing: DocumentListResponse = serde_json::from_value(body).unwrap();
    assert_eq!(listing.count, 2);
    assert_eq!(listing.documents[0].id, "a");
    assert_eq!(listing.documents[0].text, "alpha again");
    assert_eq!(listing.documents[1].id, "b");
}

#[tokio::test]
async fn search_defaults_top_k_to_five() {
    let (_backend, app) = memory_app();
    for i in 0..7 {
        send(
            &app,
            Method::POST,
            "/api/documents",
            Some(json!({"id": format!("d{i}"), "text": format!("document {i}")})),
        )
        .await;
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({"query": "document 3"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let found: SearchResponse = serde_json::from_value(body).unwrap();
    assert_eq!(found.results.len(), 5);
    assert_eq!(found.results[0].id, "d3");
}

#[tokio::test]
async fn health_reports_backend_state() {
    let (backend, app) = memory_app();

    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "connected");
    assert_eq!(body["collection"], COLLECTION);
    assert_eq!(body["collections"], 1);
    assert_eq!(body["endpoint"], "/api/v1/collections");

    backend.fail_route("/api/v1/collections", 503);
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");
    assert!(body["detail"].as_str().unwrap().contains("health"));
}

#[tokio::test]
async fn degraded_backend_answers_503_then_recovers() {
    let (backend, app) = memory_app();
    backend.fail_route("/api/v1/collections", 503);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/documents",
        Some(json!({"id": "doc1", "text": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    assert!(body["detail"].is_string());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({"query": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    backend.heal_route("/api/v1/collections");
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/documents",
        Some(json!({"id": "doc1", "text": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_collection_answers_503() {
    let backend = Arc::new(MemoryBackend::new(COLLECTION, DIMENSION).without_collections());
    let config = ServerConfig {
        service: ServiceConfig {
            ensure_collection: false,
            ..test_config().service
        },
        ..test_config()
    };
    let app = test_app(&backend, config);

    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["backend"], "connected");
    assert_eq!(body["detail"], "collection docs not initialized");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/documents",
        Some(json!({"id": "doc1", "text": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    assert_eq!(backend.calls("/api/v1/collections/docs/vectors"), 0);
}

#[tokio::test]
async fn exhausted_discovery_lists_attempts() {
    let (backend, app) = memory_app();
    send(&app, Method::GET, "/api/health", None).await;
    backend.fail_route("/api/v1/collections/docs/search", 500);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({"query": "anything", "top_k": 3})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "ENDPOINT_NOT_FOUND");
    let attempts = body["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 9);
    assert!(attempts[0]
        .as_str()
        .unwrap()
        .starts_with("POST /collections/docs/search"));
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let (backend, app) = memory_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/documents",
        Some(json!({"id": "", "text": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/search",
        Some(json!({"query": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for top_k in [0, 11] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/search",
            Some(json!({"query": "hello", "top_k": top_k})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("top_k"));
    }

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/documents",
        Some(json!({"text": "missing id"})),
    )
    .await;
    assert!(status.is_client_error());

    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test]
async fn discovery_endpoint_lists_cached_routes() {
    let (_backend, app) = memory_app();

    let (status, body) = send(&app, Method::GET, "/api/discovery", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], false);
    assert!(body["endpoints"].as_array().unwrap().is_empty());

    send(
        &app,
        Method::POST,
        "/api/documents",
        Some(json!({"id": "x", "text": "y"})),
    )
    .await;

    let (_, body) = send(&app, Method::GET, "/api/discovery", None).await;
    assert_eq!(body["ready"], true);
    let endpoints = body["endpoints"].as_array().unwrap();
    let insert = endpoints
        .iter()
        .find(|e| e["operation"] == "insert")
        .unwrap();
    assert_eq!(insert["route"], "/api/v1/collections/{collection}/vectors");
    assert_eq!(insert["method"], "POST");
    assert!(insert["discovered_at"].is_string());
}

#[tokio::test]
async fn unknown_routes_are_json_404s() {
    let (_backend, app) = memory_app();
    let (status, body) = send(&app, Method::GET, "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Not found", "code": "NOT_FOUND"}));
}

#[tokio::test]
async fn request_ids_are_echoed_or_generated() {
    let (_backend, app) = memory_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");

    let response = app
        .oneshot(Request::builder().uri("/api").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"].len(), 36);
}

#[tokio::test]
async fn root_serves_the_frontend() {
    let dir = tempfile::tempdir().unwrap();
    let mut file = std::fs::File::create(dir.path().join("index.html")).unwrap();
    file.write_all(b"<html><body>smart search</body></html>")
        .unwrap();

    let backend = Arc::new(MemoryBackend::new(COLLECTION, DIMENSION));
    let config = ServerConfig {
        static_dir: dir.path().to_path_buf(),
        ..test_config()
    };
    let app = test_app(&backend, config);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&bytes).contains("smart search"));
}
