//! In-process vector store speaking a single backend dialect.
//!
//! Used for offline runs and for tests that need a backend whose routes are
//! unknown to the caller. Requests to any other route answer 404; the right
//! route with the wrong payload shape answers 400.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Map, Value};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::candidate::{CandidateEndpoint, PayloadShape, TopKField, VectorField};
use crate::transport::{BackendReply, BackendRequest, BackendTransport, TransportError};
use crate::Operation;

/// The one (route, shape) pair per operation a [`MemoryBackend`] accepts.
#[derive(Debug, Clone)]
pub struct Dialect {
    endpoints: Vec<CandidateEndpoint>,
}

impl Dialect {
    pub fn new(endpoints: Vec<CandidateEndpoint>) -> Self {
        Self { endpoints }
    }

    /// Versioned `/api/v1` routes, array upserts and `k` searches. None of these
    /// are first in the standard candidate tables.
    pub fn standard() -> Self {
        Self::new(vec![
            CandidateEndpoint::get(Operation::Health, "/api/v1/collections"),
            CandidateEndpoint::post(
                Operation::CreateCollection,
                "/api/v1/collections",
                PayloadShape::CollectionSpec,
            ),
            CandidateEndpoint::post(
                Operation::Insert,
                "/api/v1/collections/{collection}/vectors",
                PayloadShape::VectorArray {
                    field: VectorField::Values,
                },
            ),
            CandidateEndpoint::post(
                Operation::Search,
                "/api/v1/collections/{collection}/search",
                PayloadShape::Query { top_k: TopKField::K },
            ),
        ])
    }

    pub fn endpoint(&self, operation: Operation) -> Option<&CandidateEndpoint> {
        self.endpoints.iter().find(|e| e.operation == operation)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone)]
struct StoredVector {
    id: String,
    values: Vec<f32>,
    metadata: Value,
}

/// Fake vector database with per-route call counters and failure injection.
#[derive(Debug)]
pub struct MemoryBackend {
    collection: String,
    dimension: usize,
    dialect: Dialect,
    collections: RwLock<Vec<String>>,
    vectors: RwLock<Vec<StoredVector>>,
    calls: DashMap<String, usize>,
    failures: DashMap<String, u16>,
}

impl MemoryBackend {
    /// Creates a backend that already holds an empty `collection`.
    pub fn new(collection: impl Into<String>, dimension: usize) -> Self {
        let collection = collection.into();
        Self {
            collections: RwLock::new(vec![collection.clone()]),
            collection,
            dimension,
            dialect: Dialect::standard(),
            vectors: RwLock::new(Vec::new()),
            calls: DashMap::new(),
            failures: DashMap::new(),
        }
    }

    /// Starts with no collections at all, so the configured one must be created.
    pub fn without_collections(self) -> Self {
        write(&self.collections).clear();
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Rendered path the dialect accepts for `operation`.
    pub fn path_for(&self, operation: Operation) -> Option<String> {
        self.dialect
            .endpoint(operation)
            .map(|endpoint| endpoint.path(&self.collection))
    }

    /// Makes every request to `path` answer `status` until healed.
    pub fn fail_route(&self, path: impl Into<String>, status: u16) {
        self.failures.insert(path.into(), status);
    }

    pub fn heal_route(&self, path: &str) {
        self.failures.remove(path);
    }

    pub fn calls(&self, path: &str) -> usize {
        self.calls.get(path).map(|count| *count).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }

    pub fn reset_calls(&self) {
        self.calls.clear();
    }

    pub fn vector_count(&self) -> usize {
        read(&self.vectors).len()
    }

    fn handle(&self, request: &BackendRequest) -> BackendReply {
        *self.calls.entry(request.path.clone()).or_insert(0) += 1;

        if let Some(status) = self.failures.get(&request.path) {
            return error_reply(*status, "injected failure");
        }

        let Some(endpoint) = self.dialect.endpoints.iter().find(|endpoint| {
            endpoint.method == request.method && endpoint.path(&self.collection) == request.path
        }) else {
            return error_reply(404, "not found");
        };

        if infer_shape(request.body.as_ref()) != Some(endpoint.shape) {
            return error_reply(400, "unexpected payload");
        }

        match endpoint.operation {
            Operation::Health => self.list_collections(),
            Operation::CreateCollection => self.create_collection(request.body.as_ref()),
            Operation::Insert => self.upsert(request.body.as_ref()),
            Operation::Search => self.search(request.body.as_ref()),
        }
    }

    fn list_collections(&self) -> BackendReply {
        let collections: Vec<Value> = read(&self.collections)
            .iter()
            .map(|name| json!({ "name": name, "dimension": self.dimension }))
            .collect();
        BackendReply::json(200, &json!({ "collections": collections }))
    }

    fn create_collection(&self, body: Option<&Value>) -> BackendReply {
        let Some(name) = body.and_then(|b| b.get("name")).and_then(Value::as_str) else {
            return error_reply(400, "missing collection name");
        };
        let mut collections = write(&self.collections);
        if collections.iter().any(|existing| existing == name) {
            return error_reply(409, "collection already exists");
        }
        collections.push(name.to_string());
        BackendReply::json(201, &json!({ "name": name, "dimension": self.dimension }))
    }

    fn upsert(&self, body: Option<&Value>) -> BackendReply {
        let records: Vec<&Value> = match body {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(Value::Object(map)) => match map.get("vectors").and_then(Value::as_array) {
                Some(items) => items.iter().collect(),
                None => body.into_iter().collect(),
            },
            _ => Vec::new(),
        };

        let mut parsed = Vec::with_capacity(records.len());
        for record in records {
            let Some(stored) = parse_record(record) else {
                return error_reply(400, "malformed vector record");
            };
            if stored.values.len() != self.dimension {
                return error_reply(400, "dimension mismatch");
            }
            parsed.push(stored);
        }

        let upserted = parsed.len();
        let mut vectors = write(&self.vectors);
        for stored in parsed {
            match vectors.iter_mut().find(|existing| existing.id == stored.id) {
                Some(existing) => *existing = stored,
                None => vectors.push(stored),
            }
        }
        BackendReply::json(201, &json!({ "upserted": upserted }))
    }

    fn search(&self, body: Option<&Value>) -> BackendReply {
        let Some(body) = body else {
            return error_reply(400, "missing body");
        };
        let Some(query) = body
            .get("vector")
            .or_else(|| body.get("query_vector"))
            .and_then(numbers)
        else {
            return error_reply(400, "missing query vector");
        };
        let top_k = ["top_k", "k"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_u64))
            .unwrap_or(10) as usize;

        let vectors = read(&self.vectors);
        let mut scored: Vec<(f64, &StoredVector)> = Vec::new();
        for stored in vectors.iter() {
            if let Some(score) = cosine(&query, &stored.values) {
                scored.push((score, stored));
            }
        }
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let matches: Vec<Value> = scored
            .into_iter()
            .take(top_k)
            .map(|(score, stored)| json!({ "vector_id": stored.id, "similarity": score }))
            .collect();
        BackendReply::json(200, &json!({ "matches": matches }))
    }

    /// Metadata stored for `id`, as sent by the client.
    pub fn metadata(&self, id: &str) -> Option<Value> {
        read(&self.vectors)
            .iter()
            .find(|stored| stored.id == id)
            .map(|stored| stored.metadata.clone())
    }
}

#[async_trait]
impl BackendTransport for MemoryBackend {
    async fn send(&self, request: BackendRequest) -> Result<BackendReply, TransportError> {
        Ok(self.handle(&request))
    }
}

fn error_reply(status: u16, message: &str) -> BackendReply {
    BackendReply::json(status, &json!({ "error": message }))
}

fn infer_shape(body: Option<&Value>) -> Option<PayloadShape> {
    match body {
        None => Some(PayloadShape::Empty),
        Some(Value::Array(items)) => items
            .first()
            .and_then(Value::as_object)
            .and_then(vector_field)
            .map(|field| PayloadShape::VectorArray { field }),
        Some(Value::Object(map)) => {
            if map.contains_key("name") && map.contains_key("dimension") {
                Some(PayloadShape::CollectionSpec)
            } else if let Some(vectors) = map.get("vectors") {
                vectors
                    .get(0)
                    .and_then(Value::as_object)
                    .and_then(vector_field)
                    .map(|field| PayloadShape::VectorsKey { field })
            } else if map.contains_key("query_vector") {
                Some(PayloadShape::DenseQuery)
            } else if map.contains_key("vector") {
                if map.contains_key("top_k") {
                    Some(PayloadShape::Query {
                        top_k: TopKField::TopK,
                    })
                } else if map.contains_key("k") {
                    Some(PayloadShape::Query { top_k: TopKField::K })
                } else {
                    None
                }
            } else {
                vector_field(map).map(|field| PayloadShape::SingleVector { field })
            }
        }
        Some(_) => None,
    }
}

fn vector_field(record: &Map<String, Value>) -> Option<VectorField> {
    if !record.contains_key("id") {
        return None;
    }
    if record.contains_key("values") {
        Some(VectorField::Values)
    } else if record.contains_key("dense_values") {
        Some(VectorField::DenseValues)
    } else {
        None
    }
}

fn parse_record(record: &Value) -> Option<StoredVector> {
    let id = record.get("id")?.as_str()?.to_string();
    let values = record
        .get("values")
        .or_else(|| record.get("dense_values"))
        .and_then(numbers)?;
    let metadata = record.get("metadata").cloned().unwrap_or(Value::Null);
    Some(StoredVector {
        id,
        values,
        metadata,
    })
}

fn numbers(value: &Value) -> Option<Vec<f32>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}

fn cosine(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let (mut dot, mut na, mut nb) = (0f64, 0f64, 0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return None;
    }
    Some(dot / (na.sqrt() * nb.sqrt()))
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
