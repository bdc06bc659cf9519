//! Statically enumerated route + payload guesses, one ordered table per operation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::Operation;

/// Placeholder substituted with the collection name when a route is attempted.
pub const COLLECTION_PLACEHOLDER: &str = "{collection}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// Field name carrying the vector values in an upsert record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorField {
    Values,
    DenseValues,
}

impl VectorField {
    pub fn key(&self) -> &'static str {
        match self {
            VectorField::Values => "values",
            VectorField::DenseValues => "dense_values",
        }
    }
}

/// Field name carrying the requested neighbor count in a search body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopKField {
    TopK,
    K,
}

impl TopKField {
    pub fn key(&self) -> &'static str {
        match self {
            TopKField::TopK => "top_k",
            TopKField::K => "k",
        }
    }
}

/// JSON layout a logical payload is rendered into for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayloadShape {
    /// No request body.
    Empty,
    /// `{name, dimension, description}`
    CollectionSpec,
    /// `{id, <field>, metadata: {text}}`
    SingleVector { field: VectorField },
    /// `[{id, <field>, metadata: {text}}]`
    VectorArray { field: VectorField },
    /// `{vectors: [{id, <field>, metadata: {text}}]}`
    VectorsKey { field: VectorField },
    /// `{vector, <top_k | k>}`
    Query { top_k: TopKField },
    /// `{query_vector, top_k, return_raw_text: true}`
    DenseQuery,
}

impl fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadShape::Empty => f.write_str("empty"),
            PayloadShape::CollectionSpec => f.write_str("collection_spec"),
            PayloadShape::SingleVector { field } => write!(f, "single_vector({})", field.key()),
            PayloadShape::VectorArray { field } => write!(f, "vector_array({})", field.key()),
            PayloadShape::VectorsKey { field } => write!(f, "vectors_key({})", field.key()),
            PayloadShape::Query { top_k } => write!(f, "query({})", top_k.key()),
            PayloadShape::DenseQuery => f.write_str("dense_query"),
        }
    }
}

/// One guessed (route, payload shape) pair for an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateEndpoint {
    pub operation: Operation,
    pub method: HttpMethod,
    /// Route template, may contain [`COLLECTION_PLACEHOLDER`].
    pub route: String,
    pub shape: PayloadShape,
}

impl CandidateEndpoint {
    pub fn new(
        operation: Operation,
        method: HttpMethod,
        route: impl Into<String>,
        shape: PayloadShape,
    ) -> Self {
        Self {
            operation,
            method,
            route: route.into(),
            shape,
        }
    }

    pub fn get(operation: Operation, route: impl Into<String>) -> Self {
        Self::new(operation, HttpMethod::Get, route, PayloadShape::Empty)
    }

    pub fn post(operation: Operation, route: impl Into<String>, shape: PayloadShape) -> Self {
        Self::new(operation, HttpMethod::Post, route, shape)
    }

    /// Concrete request path for `collection`.
    pub fn path(&self, collection: &str) -> String {
        self.route.replace(COLLECTION_PLACEHOLDER, collection)
    }
}

impl fmt::Display for CandidateEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.method, self.route, self.shape)
    }
}

const COLLECTION_ROUTES: [&str; 5] = [
    "/collections",
    "/api/collections",
    "/api/v1/collections",
    "/v1/collections",
    "/vectordb/collections",
];

const INSERT_ROUTES: [&str; 5] = [
    "/collections/{collection}/vectors",
    "/collections/{collection}/vectors/upsert",
    "/api/collections/{collection}/vectors",
    "/api/v1/collections/{collection}/vectors",
    "/v1/collections/{collection}/upsert",
];
const DENSE_INSERT_ROUTE: &str = "/vectordb/collections/{collection}/vectors";

const SEARCH_ROUTES: [&str; 4] = [
    "/collections/{collection}/search",
    "/api/collections/{collection}/search",
    "/api/v1/collections/{collection}/search",
    "/v1/collections/{collection}/query",
];
const DENSE_SEARCH_ROUTE: &str = "/vectordb/collections/{collection}/search/dense";

/// Ordered candidate tables keyed by operation.
#[derive(Debug, Clone, Default)]
pub struct CandidateCatalog {
    tables: HashMap<Operation, Vec<CandidateEndpoint>>,
}

impl CandidateCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in guesses for a collection-oriented vector database REST API.
    pub fn standard() -> Self {
        let health = COLLECTION_ROUTES
            .iter()
            .map(|route| CandidateEndpoint::get(Operation::Health, *route))
            .collect();

        let create = COLLECTION_ROUTES
            .iter()
            .map(|route| {
                CandidateEndpoint::post(
                    Operation::CreateCollection,
                    *route,
                    PayloadShape::CollectionSpec,
                )
            })
            .collect();

        let mut insert: Vec<CandidateEndpoint> = INSERT_ROUTES
            .iter()
            .flat_map(|route| {
                [
                    PayloadShape::SingleVector {
                        field: VectorField::Values,
                    },
                    PayloadShape::VectorArray {
                        field: VectorField::Values,
                    },
                ]
                .map(|shape| CandidateEndpoint::post(Operation::Insert, *route, shape))
            })
            .collect();
        insert.push(CandidateEndpoint::post(
            Operation::Insert,
            DENSE_INSERT_ROUTE,
            PayloadShape::SingleVector {
                field: VectorField::DenseValues,
            },
        ));
        insert.push(CandidateEndpoint::post(
            Operation::Insert,
            DENSE_INSERT_ROUTE,
            PayloadShape::VectorsKey {
                field: VectorField::DenseValues,
            },
        ));

        let mut search: Vec<CandidateEndpoint> = SEARCH_ROUTES
            .iter()
            .flat_map(|route| {
                [
                    PayloadShape::Query {
                        top_k: TopKField::TopK,
                    },
                    PayloadShape::Query { top_k: TopKField::K },
                ]
                .map(|shape| CandidateEndpoint::post(Operation::Search, *route, shape))
            })
            .collect();
        search.push(CandidateEndpoint::post(
            Operation::Search,
            DENSE_SEARCH_ROUTE,
            PayloadShape::DenseQuery,
        ));

        Self::empty()
            .with_candidates(Operation::Health, health)
            .with_candidates(Operation::CreateCollection, create)
            .with_candidates(Operation::Insert, insert)
            .with_candidates(Operation::Search, search)
    }

    /// Replaces the table for `operation`.
    pub fn with_candidates(mut self, operation: Operation, candidates: Vec<CandidateEndpoint>) -> Self {
        self.tables.insert(operation, candidates);
        self
    }

    pub fn candidates(&self, operation: Operation) -> &[CandidateEndpoint] {
        self.tables
            .get(&operation)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
