use negotiate::{AttemptRecord, NegotiateError, Operation};
use thiserror::Error;

use crate::config::ConfigLoadError;

/// Errors that can occur while serving documents and searches.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    /// Backend unreachable or collection not ready; the service is degraded.
    #[error("service not ready: {0}")]
    Configuration(String),

    #[error("no endpoint accepted {operation} after {} attempts", .attempts.len())]
    EndpointNotFound {
        operation: Operation,
        attempts: Vec<AttemptRecord>,
    },

    #[error("backend error: {0}")]
    Backend(String),

    #[error("invalid request: {0}")]
    Validation(String),
}

impl ServiceError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Configuration(_) => "SERVICE_UNAVAILABLE",
            ServiceError::EndpointNotFound { .. } => "ENDPOINT_NOT_FOUND",
            ServiceError::Backend(_) => "BACKEND_ERROR",
            ServiceError::Validation(_) => "VALIDATION_ERROR",
        }
    }

    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            ServiceError::EndpointNotFound { attempts, .. } => attempts,
            _ => &[],
        }
    }
}

impl From<NegotiateError> for ServiceError {
    fn from(value: NegotiateError) -> Self {
        match value {
            NegotiateError::EndpointNotFound {
                operation,
                attempts,
            } => ServiceError::EndpointNotFound {
                operation,
                attempts,
            },
            NegotiateError::Backend(msg) => ServiceError::Backend(msg),
        }
    }
}

impl From<ConfigLoadError> for ServiceError {
    fn from(value: ConfigLoadError) -> Self {
        ServiceError::Configuration(value.to_string())
    }
}
