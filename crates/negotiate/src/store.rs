use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A caller-supplied document as last inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

/// Read side used by result normalization to attach original text.
pub trait TextLookup {
    fn text_for(&self, id: &str) -> Option<String>;
}

/// Process-lifetime enrichment cache mapping document id to original text.
///
/// Never persisted and never the source of truth: it starts empty on every
/// restart, and a miss only means a result is returned without its text.
#[derive(Debug, Default)]
pub struct DocumentStore {
    inner: RwLock<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    order: Vec<String>,
    texts: HashMap<String, String>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites. An overwrite keeps the original insertion position.
    pub fn put(&self, id: impl Into<String>, text: impl Into<String>) {
        let id = id.into();
        let mut inner = self.write();
        if inner.texts.insert(id.clone(), text.into()).is_none() {
            inner.order.push(id);
        }
    }

    pub fn get(&self, id: &str) -> Option<String> {
        self.read().texts.get(id).cloned()
    }

    /// All documents in insertion order.
    pub fn list(&self) -> Vec<Document> {
        let inner = self.read();
        inner
            .order
            .iter()
            .filter_map(|id| {
                inner.texts.get(id).map(|text| Document {
                    id: id.clone(),
                    text: text.clone(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TextLookup for DocumentStore {
    fn text_for(&self, id: &str) -> Option<String> {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn put_then_list_round_trips() {
        let store = DocumentStore::new();
        store.put("x", "hi");
        assert_eq!(
            store.list(),
            vec![Document {
                id: "x".into(),
                text: "hi".into()
            }]
        );
    }

    #[test]
    fn overwrite_keeps_position_and_replaces_text() {
        let store = DocumentStore::new();
        store.put("a", "one");
        store.put("b", "two");
        store.put("a", "uno");

        let docs = store.list();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "a");
        assert_eq!(docs[0].text, "uno");
        assert_eq!(docs[1].id, "b");
        assert_eq!(store.get("a").as_deref(), Some("uno"));
    }

    #[test]
    fn missing_id_is_absent() {
        let store = DocumentStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("nope"), None);
        assert_eq!(store.text_for("nope"), None);
    }

    #[test]
    fn concurrent_writers_do_not_lose_entries() {
        let store = Arc::new(DocumentStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.put(format!("doc-{t}-{i}"), format!("text {i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 400);
    }
}
