//! Memory store contract and the in-memory implementation.

use crate::error::MemoryError;
use crate::model::{MemoryItem, MemoryValue, Namespace};
use crate::recall::{MemoryRecallOptions, similarity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
/// Namespaced key-value store with text-similarity search.
pub trait MemoryStore: Send + Sync {
    /// Insert or overwrite the value under `key`.
    async fn put(
        &self,
        namespace: &Namespace,
        key: &str,
        value: MemoryValue,
    ) -> Result<(), MemoryError>;

    /// Fetch a single item by key.
    async fn get(
        &self,
        namespace: &Namespace,
        key: &str,
    ) -> Result<Option<MemoryItem>, MemoryError>;

    /// Search a namespace.
    ///
    /// A non-empty query ranks items by similarity and drops non-matching ones.
    /// An empty query returns the most recently updated items, unranked.
    async fn search(
        &self,
        namespace: &Namespace,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MemoryItem>, MemoryError>;

    /// Delete an item, returning whether it existed.
    async fn delete(&self, namespace: &Namespace, key: &str) -> Result<bool, MemoryError>;

    /// Delete up to `limit` items from a namespace, returning how many were removed.
    async fn purge(&self, namespace: &Namespace, limit: usize) -> Result<usize, MemoryError> {
        let items = self.search(namespace, "", limit).await?;
        let mut removed = 0;
        for item in items {
            if self.delete(namespace, &item.key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[derive(Debug, Clone)]
struct StoredValue {
    value: MemoryValue,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision: u64,
}

#[derive(Debug, Default)]
struct StoreState {
    namespaces: HashMap<Namespace, HashMap<String, StoredValue>>,
    revision: u64,
}

/// Process-local memory store guarded by a read-write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<StoreState>>,
    recall: MemoryRecallOptions,
}

impl InMemoryStore {
    pub fn new() -> Self {
        info!("initialized in-memory store");
        Self::default()
    }

    /// Override recall scoring options.
    pub fn with_recall_options(mut self, recall: MemoryRecallOptions) -> Self {
        self.recall = recall;
        self
    }

    /// Number of items stored under a namespace.
    pub fn len(&self, namespace: &Namespace) -> usize {
        self.inner
            .read()
            .namespaces
            .get(namespace)
            .map_or(0, HashMap::len)
    }

    /// Whether a namespace holds no items.
    pub fn is_empty(&self, namespace: &Namespace) -> bool {
        self.len(namespace) == 0
    }
}

fn to_item(
    namespace: &Namespace,
    key: &str,
    stored: &StoredValue,
    score: Option<f32>,
) -> MemoryItem {
    MemoryItem {
        key: key.to_string(),
        namespace: namespace.clone(),
        value: stored.value.clone(),
        score,
        created_at: stored.created_at,
        updated_at: stored.updated_at,
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn put(
        &self,
        namespace: &Namespace,
        key: &str,
        value: MemoryValue,
    ) -> Result<(), MemoryError> {
        namespace.validate()?;
        let now = Utc::now();
        let mut state = self.inner.write();
        state.revision += 1;
        let revision = state.revision;
        let entries = state.namespaces.entry(namespace.clone()).or_default();
        let created_at = entries.get(key).map_or(now, |existing| existing.created_at);
        entries.insert(
            key.to_string(),
            StoredValue {
                value,
                created_at,
                updated_at: now,
                revision,
            },
        );
        debug!("stored memory (namespace={}, key={})", namespace, key);
        Ok(())
    }

    async fn get(
        &self,
        namespace: &Namespace,
        key: &str,
    ) -> Result<Option<MemoryItem>, MemoryError> {
        let state = self.inner.read();
        Ok(state
            .namespaces
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .map(|stored| to_item(namespace, key, stored, None)))
    }

    async fn search(
        &self,
        namespace: &Namespace,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MemoryItem>, MemoryError> {
        namespace.validate()?;
        let state = self.inner.read();
        let Some(entries) = state.namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut ranked: Vec<(Option<f32>, u64, &String, &StoredValue)> = if query.trim().is_empty() {
            entries
                .iter()
                .map(|(key, stored)| (None, stored.revision, key, stored))
                .collect()
        } else {
            entries
                .iter()
                .filter_map(|(key, stored)| {
                    let score = similarity(query, &stored.value);
                    self.recall
                        .accepts(score)
                        .then_some((Some(score), stored.revision, key, stored))
                })
                .collect()
        };
        ranked.sort_by(|a, b| {
            let by_score = b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal);
            by_score.then_with(|| b.1.cmp(&a.1))
        });

        let items: Vec<MemoryItem> = ranked
            .into_iter()
            .take(limit)
            .map(|(score, _, key, stored)| to_item(namespace, key, stored, score))
            .collect();
        debug!(
            "searched memories (namespace={}, query_len={}, returned={})",
            namespace,
            query.len(),
            items.len()
        );
        Ok(items)
    }

    async fn delete(&self, namespace: &Namespace, key: &str) -> Result<bool, MemoryError> {
        let mut state = self.inner.write();
        let removed = state
            .namespaces
            .get_mut(namespace)
            .and_then(|entries| entries.remove(key))
            .is_some();
        if removed {
            debug!("deleted memory (namespace={}, key={})", namespace, key);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryStore, MemoryStore};
    use crate::{MemoryRecallOptions, MemoryValue, Namespace};
    use pretty_assertions::assert_eq;

    fn ns(user: &str) -> Namespace {
        Namespace::new("memories", user)
    }

    #[tokio::test]
    async fn put_overwrites_key_and_keeps_created_at() {
        let store = InMemoryStore::new();
        let namespace = ns("u1");
        store
            .put(&namespace, "k1", MemoryValue::new("likes tea"))
            .await
            .expect("put");
        let first = store.get(&namespace, "k1").await.expect("get").expect("item");
        store
            .put(&namespace, "k1", MemoryValue::new("likes coffee"))
            .await
            .expect("put");
        let second = store.get(&namespace, "k1").await.expect("get").expect("item");

        assert_eq!(store.len(&namespace), 1);
        assert_eq!(second.value.content, "likes coffee");
        assert_eq!(second.created_at, first.created_at);
    }

    #[tokio::test]
    async fn empty_query_returns_most_recent_first() {
        let store = InMemoryStore::new();
        let namespace = ns("u1");
        for (key, content) in [("a", "first"), ("b", "second"), ("c", "third")] {
            store
                .put(&namespace, key, MemoryValue::new(content))
                .await
                .expect("put");
        }
        let items = store.search(&namespace, "", 2).await.expect("search");
        let keys: Vec<_> = items.iter().map(|item| item.key.as_str()).collect();
        assert_eq!(keys, vec!["c", "b"]);
        assert!(items.iter().all(|item| item.score.is_none()));
    }

    #[tokio::test]
    async fn ranked_search_orders_by_similarity_and_drops_misses() {
        let store = InMemoryStore::new();
        let namespace = ns("u1");
        store
            .put(&namespace, "name", MemoryValue::new("User's name is Sam"))
            .await
            .expect("put");
        store
            .put(&namespace, "sleep", MemoryValue::new("Sleeps 7.5 hours a night"))
            .await
            .expect("put");
        store
            .put(
                &namespace,
                "goal",
                MemoryValue::new("Goal is 10k steps").with_context("name of the goal: steps"),
            )
            .await
            .expect("put");

        let items = store
            .search(&namespace, "What's my name?", 3)
            .await
            .expect("search");
        let keys: Vec<_> = items.iter().map(|item| item.key.as_str()).collect();
        assert_eq!(keys, vec!["goal", "name"]);
        assert!(items.iter().all(|item| item.score.unwrap_or_default() > 0.0));
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let store = InMemoryStore::new();
        store
            .put(&ns("u1"), "k", MemoryValue::new("private to u1"))
            .await
            .expect("put");
        let other = store.search(&ns("u2"), "", 10).await.expect("search");
        assert!(other.is_empty());
        assert_eq!(store.get(&ns("u2"), "k").await.expect("get"), None);
    }

    #[tokio::test]
    async fn purge_removes_everything_in_namespace() {
        let store = InMemoryStore::new();
        let namespace = ns("u1");
        for key in ["a", "b", "c"] {
            store
                .put(&namespace, key, MemoryValue::new(key))
                .await
                .expect("put");
        }
        store
            .put(&ns("u2"), "keep", MemoryValue::new("kept"))
            .await
            .expect("put");

        let removed = store.purge(&namespace, 1000).await.expect("purge");
        assert_eq!(removed, 3);
        assert!(store.is_empty(&namespace));
        assert_eq!(store.len(&ns("u2")), 1);
        assert!(!store.delete(&namespace, "a").await.expect("delete"));
    }

    #[tokio::test]
    async fn min_score_filters_weak_matches() {
        let store = InMemoryStore::new().with_recall_options(MemoryRecallOptions {
            min_score: Some(0.9),
        });
        let namespace = ns("u1");
        store
            .put(&namespace, "k", MemoryValue::new("User's name is Sam"))
            .await
            .expect("put");
        let items = store
            .search(&namespace, "what is my name", 5)
            .await
            .expect("search");
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn blank_user_is_rejected() {
        let store = InMemoryStore::new();
        let err = store
            .put(&ns(" "), "k", MemoryValue::new("x"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("user_id"));
    }
}
