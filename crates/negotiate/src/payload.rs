use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::candidate::{PayloadShape, VectorField};
use crate::Operation;

/// Operation-specific request content, independent of any backend wire layout.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPayload {
    Probe,
    Collection {
        name: String,
        dimension: usize,
        description: String,
    },
    Insert {
        id: String,
        vector: Vec<f32>,
        text: String,
    },
    Search {
        vector: Vec<f32>,
        top_k: usize,
    },
}

/// The payload has no rendering in the requested shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} payload cannot be rendered as {shape}")]
pub struct ShapeMismatch {
    pub operation: Operation,
    pub shape: PayloadShape,
}

impl LogicalPayload {
    pub fn operation(&self) -> Operation {
        match self {
            LogicalPayload::Probe => Operation::Health,
            LogicalPayload::Collection { .. } => Operation::CreateCollection,
            LogicalPayload::Insert { .. } => Operation::Insert,
            LogicalPayload::Search { .. } => Operation::Search,
        }
    }

    /// Renders the request body for `shape`. `Ok(None)` means no body.
    pub fn render(&self, shape: &PayloadShape) -> Result<Option<Value>, ShapeMismatch> {
        let body = match (self, shape) {
            (LogicalPayload::Probe, PayloadShape::Empty) => return Ok(None),
            (
                LogicalPayload::Collection {
                    name,
                    dimension,
                    description,
                },
                PayloadShape::CollectionSpec,
            ) => json!({
                "name": name,
                "dimension": dimension,
                "description": description,
            }),
            (LogicalPayload::Insert { id, vector, text }, PayloadShape::SingleVector { field }) => {
                vector_record(id, vector, text, *field)
            }
            (LogicalPayload::Insert { id, vector, text }, PayloadShape::VectorArray { field }) => {
                Value::Array(vec![vector_record(id, vector, text, *field)])
            }
            (LogicalPayload::Insert { id, vector, text }, PayloadShape::VectorsKey { field }) => {
                json!({ "vectors": [vector_record(id, vector, text, *field)] })
            }
            (LogicalPayload::Search { vector, top_k }, PayloadShape::Query { top_k: field }) => {
                let mut body = Map::new();
                body.insert("vector".into(), json!(vector));
                body.insert(field.key().into(), json!(top_k));
                Value::Object(body)
            }
            (LogicalPayload::Search { vector, top_k }, PayloadShape::DenseQuery) => json!({
                "query_vector": vector,
                "top_k": top_k,
                "return_raw_text": true,
            }),
            _ => {
                return Err(ShapeMismatch {
                    operation: self.operation(),
                    shape: *shape,
                })
            }
        };
        Ok(Some(body))
    }
}

fn vector_record(id: &str, vector: &[f32], text: &str, field: VectorField) -> Value {
    let mut record = Map::new();
    record.insert("id".into(), json!(id));
    record.insert(field.key().into(), json!(vector));
    record.insert("metadata".into(), json!({ "text": text }));
    Value::Object(record)
}
