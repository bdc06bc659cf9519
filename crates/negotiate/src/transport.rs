//! The seam between the adapter and whatever actually answers backend requests.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::candidate::HttpMethod;
use crate::NegotiateError;

/// A single rendered backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
    pub timeout: Duration,
}

/// Raw backend answer; any status is a valid reply at this layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub status: u16,
    pub body: String,
}

impl BackendReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The call never produced a status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Failed(String),
}

#[async_trait]
pub trait BackendTransport: Send + Sync {
    async fn send(&self, request: BackendRequest) -> Result<BackendReply, TransportError>;
}

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub accept_invalid_certs: bool,
    pub connect_timeout: Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8443".into(),
            username: None,
            password: None,
            accept_invalid_certs: false,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Pooled `reqwest` client against a backend base URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl HttpTransport {
    pub fn new(cfg: HttpTransportConfig) -> Result<Self, NegotiateError> {
        let client = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout)
            .pool_max_idle_per_host(32)
            .danger_accept_invalid_certs(cfg.accept_invalid_certs)
            .build()
            .map_err(|e| NegotiateError::Backend(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            username: cfg.username,
            password: cfg.password,
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn dispatch(&self, request: BackendRequest) -> Result<BackendReply, TransportError> {
        let url = self.url_for(&request.path);
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
        };
        builder = builder.timeout(request.timeout);
        if let Some(username) = self.username.as_deref() {
            builder = builder.basic_auth(username, self.password.as_deref());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| classify(e, request.timeout))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| classify(e, request.timeout))?;
        Ok(BackendReply { status, body })
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::Failed(err.to_string())
    }
}

#[async_trait]
impl BackendTransport for HttpTransport {
    async fn send(&self, request: BackendRequest) -> Result<BackendReply, TransportError> {
        let timeout = request.timeout;
        tokio::time::timeout(timeout, self.dispatch(request))
            .await
            .unwrap_or(Err(TransportError::Timeout(timeout)))
    }
}
