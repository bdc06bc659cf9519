use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use crate::candidate::{CandidateCatalog, CandidateEndpoint, HttpMethod, PayloadShape};
use crate::Operation;

/// A candidate confirmed working and cached for its operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredEndpoint {
    pub operation: Operation,
    pub method: HttpMethod,
    pub route: String,
    pub shape: PayloadShape,
    pub discovered_at: DateTime<Utc>,
}

impl DiscoveredEndpoint {
    fn from_candidate(candidate: &CandidateEndpoint) -> Self {
        Self {
            operation: candidate.operation,
            method: candidate.method,
            route: candidate.route.clone(),
            shape: candidate.shape,
            discovered_at: Utc::now(),
        }
    }

    pub fn candidate(&self) -> CandidateEndpoint {
        CandidateEndpoint::new(self.operation, self.method, self.route.clone(), self.shape)
    }

    pub fn matches(&self, candidate: &CandidateEndpoint) -> bool {
        self.operation == candidate.operation
            && self.method == candidate.method
            && self.route == candidate.route
            && self.shape == candidate.shape
    }
}

/// Where an operation starts: its cached endpoint, or the top of its candidate table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Discovered(DiscoveredEndpoint),
    Candidate(CandidateEndpoint),
}

/// One step of an attempt plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAttempt {
    pub candidate: CandidateEndpoint,
    pub from_cache: bool,
}

/// Candidate tables plus one known-good slot per operation.
///
/// Slots are shared across concurrent requests; competing successes resolve
/// last-write-wins.
#[derive(Debug, Default)]
pub struct EndpointDiscoverer {
    catalog: CandidateCatalog,
    discovered: DashMap<Operation, DiscoveredEndpoint>,
}

impl EndpointDiscoverer {
    pub fn new(catalog: CandidateCatalog) -> Self {
        Self {
            catalog,
            discovered: DashMap::new(),
        }
    }

    pub fn standard() -> Self {
        Self::new(CandidateCatalog::standard())
    }

    pub fn candidates(&self, operation: Operation) -> &[CandidateEndpoint] {
        self.catalog.candidates(operation)
    }

    /// Returns `None` only when the operation has no candidates and nothing cached.
    pub fn resolve(&self, operation: Operation) -> Option<Resolution> {
        if let Some(found) = self.discovered(operation) {
            return Some(Resolution::Discovered(found));
        }
        self.candidates(operation)
            .first()
            .cloned()
            .map(Resolution::Candidate)
    }

    /// Starts from [`resolve`](Self::resolve): a cached endpoint leads the plan
    /// and is dropped from the table that follows it.
    pub fn attempt_plan(&self, operation: Operation) -> Vec<PlannedAttempt> {
        let table = self.candidates(operation);
        let mut plan = Vec::with_capacity(table.len() + 1);

        let cached = match self.resolve(operation) {
            Some(Resolution::Discovered(found)) => {
                let candidate = found.candidate();
                plan.push(PlannedAttempt {
                    candidate: candidate.clone(),
                    from_cache: true,
                });
                Some(candidate)
            }
            Some(Resolution::Candidate(_)) | None => None,
        };
        plan.extend(
            table
                .iter()
                .filter(|candidate| cached.as_ref() != Some(*candidate))
                .map(|candidate| PlannedAttempt {
                    candidate: candidate.clone(),
                    from_cache: false,
                }),
        );
        plan
    }

    /// Caches `candidate` for `operation`. Re-recording the cached endpoint keeps
    /// its original discovery time.
    pub fn record_success(
        &self,
        operation: Operation,
        candidate: &CandidateEndpoint,
    ) -> DiscoveredEndpoint {
        if let Some(existing) = self.discovered.get(&operation) {
            if existing.matches(candidate) {
                return existing.clone();
            }
        }

        let found = DiscoveredEndpoint::from_candidate(candidate);
        if let Some(previous) = self.discovered.insert(operation, found.clone()) {
            tracing::info!(
                operation = %operation,
                previous = %previous.route,
                route = %found.route,
                "replaced discovered endpoint"
            );
        } else {
            tracing::info!(
                operation = %operation,
                route = %found.route,
                shape = %found.shape,
                "discovered endpoint"
            );
        }
        found
    }

    pub fn discovered(&self, operation: Operation) -> Option<DiscoveredEndpoint> {
        self.discovered.get(&operation).map(|entry| entry.clone())
    }

    pub fn forget(&self, operation: Operation) -> Option<DiscoveredEndpoint> {
        self.discovered.remove(&operation).map(|(_, found)| found)
    }

    /// Clears the slot only if it still holds `candidate`, so a winner recorded
    /// concurrently by another request survives.
    pub fn forget_if(
        &self,
        operation: Operation,
        candidate: &CandidateEndpoint,
    ) -> Option<DiscoveredEndpoint> {
        self.discovered
            .remove_if(&operation, |_, found| found.matches(candidate))
            .map(|(_, found)| found)
    }

    /// Cached endpoints in [`Operation::ALL`] order.
    pub fn snapshot(&self) -> Vec<DiscoveredEndpoint> {
        Operation::ALL
            .iter()
            .filter_map(|operation| self.discovered(*operation))
            .collect()
    }
}
