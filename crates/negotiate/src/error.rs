use thiserror::Error;

use crate::adapter::AttemptRecord;
use crate::Operation;

/// Errors surfaced by the negotiation layer.
#[derive(Debug, Clone, Error)]
pub enum NegotiateError {
    /// Every candidate for the operation was tried and none answered 2xx.
    #[error("no endpoint accepted {operation} after {} attempts", .attempts.len())]
    EndpointNotFound {
        operation: Operation,
        attempts: Vec<AttemptRecord>,
    },
    /// The backend client itself could not be set up or used.
    #[error("backend error: {0}")]
    Backend(String),
}

impl NegotiateError {
    /// Attempts made before giving up; empty for non-discovery errors.
    pub fn attempts(&self) -> &[AttemptRecord] {
        match self {
            NegotiateError::EndpointNotFound { attempts, .. } => attempts,
            NegotiateError::Backend(_) => &[],
        }
    }
}
