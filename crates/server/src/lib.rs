//! Smart Search Server - HTTP REST API for text search over a vector backend
//!
//! This crate exposes [`smart_search::SearchService`] over HTTP. Documents are
//! embedded with a deterministic placeholder embedder and written to a vector
//! backend whose routes and payload shapes are discovered at runtime.
//!
//! # Features
//!
//! - **Degraded mode**: the server starts even when the backend is down and
//!   recovers on the next successful probe
//! - **Middleware**: Compression, CORS, request ID tracking, structured logging
//! - **Configuration**: `.env`, `server.{toml,yaml,json}` and `SMART_SEARCH__*`
//!   environment variables
//! - **Error Handling**: `{detail, code}` error bodies, with the attempted
//!   endpoints when discovery fails
//! - **Graceful Shutdown**: SIGTERM and Ctrl+C
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - Frontend (`static_dir/index.html`)
//! - `GET /api` - API information
//! - `GET /api/health` - Backend health probe
//! - `POST /api/documents` - Add a document
//! - `GET /api/documents` - List documents added since startup
//! - `POST /api/search` - Text search
//! - `GET /api/discovery` - Cached backend endpoints

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
