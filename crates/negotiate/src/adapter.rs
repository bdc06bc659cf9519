use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::candidate::{CandidateEndpoint, HttpMethod, PayloadShape};
use crate::discovery::EndpointDiscoverer;
use crate::payload::LogicalPayload;
use crate::transport::{BackendRequest, BackendTransport, TransportError};
use crate::{NegotiateError, Operation};

/// Result of one (route, shape) attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Status(u16),
    Timeout,
    Transport(String),
    Incompatible,
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Status(status) if (200..300).contains(status))
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Status(status) => write!(f, "{status}"),
            AttemptOutcome::Timeout => f.write_str("timeout"),
            AttemptOutcome::Transport(msg) => write!(f, "transport error: {msg}"),
            AttemptOutcome::Incompatible => f.write_str("incompatible payload"),
        }
    }
}

/// Diagnostic trail entry for one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    pub method: HttpMethod,
    /// Rendered request path.
    pub route: String,
    pub shape: PayloadShape,
    pub from_cache: bool,
    pub outcome: AttemptOutcome,
}

impl fmt::Display for AttemptRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] -> {}",
            self.method, self.route, self.shape, self.outcome
        )
    }
}

/// A successful backend call plus the attempts it took to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    pub endpoint: CandidateEndpoint,
    pub status: u16,
    pub body: Value,
    pub attempts: Vec<AttemptRecord>,
}

impl BackendResponse {
    /// Rendered path of the endpoint that answered.
    pub fn endpoint_path(&self) -> &str {
        self.attempts
            .last()
            .map(|attempt| attempt.route.as_str())
            .unwrap_or(self.endpoint.route.as_str())
    }
}

/// Drives discovery sweeps for logical operations against one collection.
pub struct RequestAdapter {
    transport: Arc<dyn BackendTransport>,
    discoverer: Arc<EndpointDiscoverer>,
    collection: String,
    attempt_timeout: Duration,
}

impl RequestAdapter {
    pub fn new(
        transport: Arc<dyn BackendTransport>,
        discoverer: Arc<EndpointDiscoverer>,
        collection: impl Into<String>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            discoverer,
            collection: collection.into(),
            attempt_timeout,
        }
    }

    pub fn discoverer(&self) -> &Arc<EndpointDiscoverer> {
        &self.discoverer
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Tries the cached endpoint, then every candidate in priority order, until
    /// one answers 2xx. Individual failures are recorded and skipped; only an
    /// exhausted plan is an error.
    pub async fn perform(
        &self,
        operation: Operation,
        payload: &LogicalPayload,
    ) -> Result<BackendResponse, NegotiateError> {
        let plan = self.discoverer.attempt_plan(operation);
        let mut attempts = Vec::with_capacity(plan.len());

        for planned in plan {
            let candidate = planned.candidate;
            let path = candidate.path(&self.collection);
            let mut record = AttemptRecord {
                method: candidate.method,
                route: path.clone(),
                shape: candidate.shape,
                from_cache: planned.from_cache,
                outcome: AttemptOutcome::Incompatible,
            };

            let body = match payload.render(&candidate.shape) {
                Ok(body) => body,
                Err(err) => {
                    debug!(operation = %operation, route = %path, error = %err, "skipping candidate");
                    self.drop_cached(operation, &candidate, planned.from_cache, &record);
                    attempts.push(record);
                    continue;
                }
            };

            let request = BackendRequest {
                method: candidate.method,
                path,
                body,
                timeout: self.attempt_timeout,
            };

            match self.transport.send(request).await {
                Ok(reply) if reply.is_success() => {
                    record.outcome = AttemptOutcome::Status(reply.status);
                    debug!(
                        operation = %operation,
                        route = %record.route,
                        status = reply.status,
                        attempt = attempts.len() + 1,
                        "backend accepted request"
                    );
                    attempts.push(record);
                    self.discoverer.record_success(operation, &candidate);
                    return Ok(BackendResponse {
                        endpoint: candidate,
                        status: reply.status,
                        body: parse_body(operation, &reply.body),
                        attempts,
                    });
                }
                Ok(reply) => record.outcome = AttemptOutcome::Status(reply.status),
                Err(TransportError::Timeout(_)) => record.outcome = AttemptOutcome::Timeout,
                Err(TransportError::Failed(msg)) => record.outcome = AttemptOutcome::Transport(msg),
            }

            debug!(
                operation = %operation,
                route = %record.route,
                shape = %record.shape,
                outcome = %record.outcome,
                "attempt failed"
            );
            self.drop_cached(operation, &candidate, planned.from_cache, &record);
            attempts.push(record);
        }

        warn!(
            operation = %operation,
            attempts = attempts.len(),
            "no candidate endpoint succeeded"
        );
        Err(NegotiateError::EndpointNotFound {
            operation,
            attempts,
        })
    }

    fn drop_cached(
        &self,
        operation: Operation,
        candidate: &CandidateEndpoint,
        from_cache: bool,
        record: &AttemptRecord,
    ) {
        if from_cache && self.discoverer.forget_if(operation, candidate).is_some() {
            info!(
                operation = %operation,
                route = %record.route,
                outcome = %record.outcome,
                "cached endpoint failed, sweeping all candidates"
            );
        }
    }
}

fn parse_body(operation: Operation, body: &str) -> Value {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|err| {
        warn!(operation = %operation, error = %err, "backend returned non-JSON body");
        Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_body_handles_empty_and_garbage() {
        assert_eq!(parse_body(Operation::Insert, ""), Value::Null);
        assert_eq!(parse_body(Operation::Insert, "  \n"), Value::Null);
        assert_eq!(parse_body(Operation::Search, "<html>oops</html>"), Value::Null);
        assert_eq!(
            parse_body(Operation::Search, r#"{"results": []}"#),
            json!({"results": []})
        );
    }

    #[test]
    fn outcome_success_is_2xx_status_only() {
        assert!(AttemptOutcome::Status(201).is_success());
        assert!(!AttemptOutcome::Status(404).is_success());
        assert!(!AttemptOutcome::Timeout.is_success());
        assert!(!AttemptOutcome::Incompatible.is_success());
    }

    #[test]
    fn attempt_record_display_is_readable() {
        let record = AttemptRecord {
            method: HttpMethod::Post,
            route: "/collections/docs/search".into(),
            shape: PayloadShape::DenseQuery,
            from_cache: false,
            outcome: AttemptOutcome::Status(404),
        };
        assert_eq!(
            record.to_string(),
            "POST /collections/docs/search [dense_query] -> 404"
        );
    }
}
