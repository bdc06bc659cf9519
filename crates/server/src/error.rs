use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use smart_search::{AttemptRecord, ServiceError};

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Not found")]
    NotFound,
}

/// API error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<String>,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Service(ServiceError::Configuration(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Service(ServiceError::Validation(_)) => StatusCode::BAD_REQUEST,
            ServerError::Service(ServiceError::EndpointNotFound { .. })
            | ServerError::Service(ServiceError::Backend(_))
            | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::Service(err) => err.code(),
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }

    fn attempts(&self) -> &[AttemptRecord] {
        match self {
            ServerError::Service(err) => err.attempts(),
            _ => &[],
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code = self.error_code(), error = %self, "request failed");
        }

        let body = ErrorResponse {
            detail: self.to_string(),
            code: self.error_code().to_string(),
            attempts: self.attempts().iter().map(ToString::to_string).collect(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Internal(format!("backend task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smart_search::Operation;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (
                ServiceError::Configuration("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                ServiceError::Backend("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::EndpointNotFound {
                    operation: Operation::Search,
                    attempts: Vec::new(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ServerError::from(err).status_code(), status);
        }
        assert_eq!(ServerError::NotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ServerError::NotFound.error_code(), "NOT_FOUND");
        assert_eq!(
            ServerError::from(ServiceError::Configuration("x".into())).error_code(),
            "SERVICE_UNAVAILABLE"
        );
    }
}
