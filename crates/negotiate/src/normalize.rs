//! Turns arbitrarily shaped search responses into canonical result records.
//!
//! The response is classified exactly once into a [`ResponseShape`]; every
//! item is then resolved through fixed alias lists. Nothing in here fails:
//! unknown shapes become empty results and unknown items are skipped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::TextLookup;

const ID_KEYS: [&str; 3] = ["id", "vector_id", "document_id"];
const SCORE_KEYS: [&str; 3] = ["score", "distance", "similarity"];
const TEXT_KEYS: [&str; 2] = ["text", "raw_text"];

/// Canonical search hit, in backend rank order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub id: String,
    pub score: f64,
    pub text: String,
}

/// Top-level layout of a backend search response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// A bare array of items.
    List(Vec<Value>),
    /// `{"results": ...}`
    ResultsKey(Vec<Value>),
    /// `{"matches": ...}` (only when `results` is absent)
    MatchesKey(Vec<Value>),
    /// Any other mapping, taken as one item.
    SingleItem(Map<String, Value>),
    Unrecognized,
}

impl ResponseShape {
    pub fn parse(raw: Value) -> Self {
        match raw {
            Value::Array(items) => ResponseShape::List(items),
            Value::Object(mut map) => {
                if let Some(results) = map.remove("results") {
                    ResponseShape::ResultsKey(unwrap_items(results))
                } else if let Some(matches) = map.remove("matches") {
                    ResponseShape::MatchesKey(unwrap_items(matches))
                } else {
                    ResponseShape::SingleItem(map)
                }
            }
            _ => ResponseShape::Unrecognized,
        }
    }

    pub fn into_items(self) -> Vec<Value> {
        match self {
            ResponseShape::List(items)
            | ResponseShape::ResultsKey(items)
            | ResponseShape::MatchesKey(items) => items,
            ResponseShape::SingleItem(map) => vec![Value::Object(map)],
            ResponseShape::Unrecognized => Vec::new(),
        }
    }
}

// `results` / `matches` normally hold an array; a lone object or scalar is one item.
fn unwrap_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Normalizes `raw` into result records, enriching text from `store` first,
/// then from the item's own `metadata.text`, then its top-level `text` or
/// `raw_text`.
pub fn normalize(raw: Value, store: &dyn TextLookup) -> Vec<SearchResultItem> {
    ResponseShape::parse(raw)
        .into_items()
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| normalize_item(index, item, store))
        .collect()
}

fn normalize_item(index: usize, item: Value, store: &dyn TextLookup) -> Option<SearchResultItem> {
    match item {
        Value::Object(map) => {
            let id = resolve_id(&map).unwrap_or_else(|| format!("unknown_{index}"));
            let score = resolve_score(&map);
            let text = store
                .text_for(&id)
                .or_else(|| embedded_text(&map))
                .unwrap_or_default();
            Some(SearchResultItem { id, score, text })
        }
        Value::String(id) => {
            let text = store.text_for(&id).unwrap_or_default();
            Some(SearchResultItem {
                id,
                score: 0.0,
                text,
            })
        }
        other => {
            tracing::debug!(index, item = %other, "skipping unrecognized result item");
            None
        }
    }
}

fn resolve_id(map: &Map<String, Value>) -> Option<String> {
    ID_KEYS.iter().find_map(|key| match map.get(*key)? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    })
}

fn resolve_score(map: &Map<String, Value>) -> f64 {
    SCORE_KEYS
        .iter()
        .find_map(|key| match map.get(*key)? {
            Value::Number(score) => score.as_f64(),
            Value::String(score) => score.parse().ok(),
            _ => None,
        })
        .unwrap_or(0.0)
}

fn embedded_text(map: &Map<String, Value>) -> Option<String> {
    map.get("metadata")
        .and_then(|metadata| metadata.get("text"))
        .and_then(Value::as_str)
        .or_else(|| {
            TEXT_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string)
}
