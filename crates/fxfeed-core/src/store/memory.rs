//! In-process store - used when no remote database is configured and as
//! the store behind every service test.
//!
//! Data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{RwLock, broadcast};

use super::push_id::PushIdGenerator;
use super::tree;
use crate::error::StoreError;
use crate::ports::store::{RemoteStore, StoreWatch, TransactionFn, path_segments};

struct Watcher {
    segments: Vec<String>,
    tx: broadcast::Sender<Option<Value>>,
}

#[derive(Default)]
struct TreeState {
    root: Value,
    watchers: HashMap<String, Watcher>,
}

/// One path is an ancestor of (or equal to) the other.
fn overlaps(watched: &[String], written: &[&str]) -> bool {
    watched.iter().zip(written).all(|(a, b)| a == b)
}

impl TreeState {
    fn value_at(&self, segments: &[String]) -> Option<Value> {
        let refs: Vec<&str> = segments.iter().map(String::as_str).collect();
        tree::lookup(&self.root, &refs).cloned()
    }

    /// Run `write` on the tree and notify every listener whose value it
    /// changed.
    fn commit(&mut self, written: &[&str], write: impl FnOnce(&mut Value)) {
        self.watchers.retain(|_, w| w.tx.receiver_count() > 0);

        let before: Vec<(String, Option<Value>)> = self
            .watchers
            .iter()
            .filter(|(_, w)| overlaps(&w.segments, written))
            .map(|(key, w)| (key.clone(), self.value_at(&w.segments)))
            .collect();

        write(&mut self.root);

        for (key, old) in before {
            if let Some(watcher) = self.watchers.get(&key) {
                let new = self.value_at(&watcher.segments);
                if new != old {
                    // No receivers left is fine; it is pruned on the next write.
                    let _ = watcher.tx.send(new);
                }
            }
        }
    }
}

/// JSON tree store guarded by an async RwLock.
pub struct InMemoryStore {
    state: RwLock<TreeState>,
    push_ids: PushIdGenerator,
    buffer_size: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_buffer(64)
    }

    /// `buffer_size` bounds how many changes a slow listener may fall behind.
    pub fn with_buffer(buffer_size: usize) -> Self {
        Self {
            state: RwLock::new(TreeState::default()),
            push_ids: PushIdGenerator::new(),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Seed the store with a whole tree.
    pub fn with_data(data: Value) -> Self {
        let store = Self::new();
        Self {
            state: RwLock::new(TreeState {
                root: tree::normalize(data),
                watchers: HashMap::new(),
            }),
            ..store
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let segments = path_segments(path)?;
        let state = self.state.read().await;
        Ok(tree::lookup(&state.root, &segments).cloned())
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = path_segments(path)?;
        let value = tree::normalize(value);
        let mut state = self.state.write().await;
        state.commit(&segments, |root| tree::write(root, &segments, value));
        tracing::trace!(path, "Store set");
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let segments = path_segments(path)?;
        let mut children = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            if path_segments(&key)?.is_empty() {
                return Err(StoreError::InvalidPath(key));
            }
            children.push((key, tree::normalize(value)));
        }

        let mut state = self.state.write().await;
        state.commit(&segments, |root| {
            for (key, value) in children {
                let mut target = segments.clone();
                target.extend(key.trim_matches('/').split('/'));
                tree::write(root, &target, value);
            }
        });
        Ok(())
    }

    fn generate_key(&self) -> String {
        self.push_ids.next_id()
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let parent = path_segments(path)?;
        let key = self.generate_key();
        let value = tree::normalize(value);
        {
            let mut segments = parent;
            segments.push(&key);
            let mut state = self.state.write().await;
            state.commit(&segments, |root| tree::write(root, &segments, value));
        }
        Ok(key)
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let segments = path_segments(path)?;
        let mut state = self.state.write().await;
        state.commit(&segments, |root| tree::write(root, &segments, Value::Null));
        Ok(())
    }

    async fn transaction(
        &self,
        path: &str,
        apply: TransactionFn<'_>,
    ) -> Result<Option<Value>, StoreError> {
        let segments = path_segments(path)?;
        let mut state = self.state.write().await;

        let Some(next) = apply(tree::lookup(&state.root, &segments)) else {
            return Ok(None);
        };
        let next = tree::normalize(next);
        let committed = next.clone();
        state.commit(&segments, |root| tree::write(root, &segments, next));

        Ok(Some(committed))
    }

    async fn subscribe(&self, path: &str) -> Result<StoreWatch, StoreError> {
        let segments = path_segments(path)?;
        let key = segments.join("/");
        let mut state = self.state.write().await;

        let current = tree::lookup(&state.root, &segments).cloned();
        let buffer_size = self.buffer_size;
        let watcher = state.watchers.entry(key).or_insert_with(|| Watcher {
            segments: segments.iter().map(|s| s.to_string()).collect(),
            tx: broadcast::channel(buffer_size).0,
        });

        Ok(StoreWatch::with_initial(current, watcher.tx.subscribe()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = InMemoryStore::new();
        store.set("news/k1", json!({ "title": "t" })).await.unwrap();

        assert_eq!(store.get("news/k1/title").await.unwrap(), Some(json!("t")));
        assert_eq!(store.get("news/missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_values_are_not_stored() {
        let store = InMemoryStore::new();
        store
            .set("news/k1", json!({ "title": "t", "likedBy": {}, "comments": [] }))
            .await
            .unwrap();

        assert_eq!(store.get("news/k1").await.unwrap(), Some(json!({ "title": "t" })));
    }

    #[tokio::test]
    async fn test_update_is_shallow() {
        let store = InMemoryStore::new();
        store
            .set("users/u1", json!({ "name": "a", "stats": { "balance": 5, "profit": 1 } }))
            .await
            .unwrap();

        let mut fields = Map::new();
        fields.insert("stats".into(), json!({ "balance": 9 }));
        fields.insert("name".into(), Value::Null);
        store.update("users/u1", fields).await.unwrap();

        assert_eq!(
            store.get("users/u1").await.unwrap(),
            Some(json!({ "stats": { "balance": 9 } }))
        );
    }

    #[tokio::test]
    async fn test_push_keys_sort_in_insert_order() {
        let store = InMemoryStore::new();
        let a = store.push("log", json!(1)).await.unwrap();
        let b = store.push("log", json!(2)).await.unwrap();

        assert!(a < b);
        assert_eq!(store.get(&format!("log/{b}")).await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_remove_missing_is_ok() {
        let store = InMemoryStore::new();
        store.remove("news/nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_transaction_abort_writes_nothing() {
        let store = InMemoryStore::new();
        let result = store.transaction("counter", &|_| None).await.unwrap();

        assert_eq!(result, None);
        assert_eq!(store.get("counter").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_transactions_lose_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = Vec::new();

        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .transaction("counter", &|current| {
                        let n = current.and_then(Value::as_u64).unwrap_or(0);
                        Some(json!(n + 1))
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.get("counter").await.unwrap(), Some(json!(50)));
    }

    #[tokio::test]
    async fn test_subscribe_sees_initial_and_child_writes() {
        let store = InMemoryStore::new();
        store.set("notifications/u1/n1", json!({ "title": "a" })).await.unwrap();

        let mut watch = store.subscribe("notifications/u1").await.unwrap();
        assert_eq!(
            watch.next().await,
            Some(Some(json!({ "n1": { "title": "a" } })))
        );

        store.set("notifications/u1/n2", json!({ "title": "b" })).await.unwrap();
        let next = tokio::time::timeout(Duration::from_secs(1), watch.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(next["n2"]["title"], "b");
    }

    #[tokio::test]
    async fn test_unrelated_write_does_not_notify() {
        let store = InMemoryStore::new();
        let mut watch = store.subscribe("notifications/u1").await.unwrap();
        assert_eq!(watch.next().await, Some(None));

        store.set("notifications/u2/n1", json!({ "title": "x" })).await.unwrap();
        let waited = tokio::time::timeout(Duration::from_millis(50), watch.next()).await;
        assert!(waited.is_err());
    }
}
