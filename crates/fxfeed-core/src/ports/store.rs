//! Remote store port - a path-keyed JSON tree.
//!
//! Paths are `/`-separated (`news/{id}`, `users/{uid}/kyc`). Writes follow
//! last-write-wins per path; `transaction` is the only read-modify-write
//! primitive that is safe against concurrent writers.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::error::StoreError;

/// Transaction body: receives the current value (if any) and returns the
/// value to commit, or `None` to abort without writing. Backends may call
/// it more than once when they detect a concurrent write.
pub type TransactionFn<'a> = &'a (dyn Fn(Option<&Value>) -> Option<Value> + Send + Sync);

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read the value at `path`. `None` when nothing is stored there.
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Overwrite the value at `path`. Writing `null` deletes it.
    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Shallow merge: each entry overwrites one child of `path`; `null`
    /// entries delete their child. Keys may be relative multi-segment
    /// paths (`"{id}/read"`).
    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Mint a push key without writing anything, for callers that need the
    /// key inside a larger transaction.
    fn generate_key(&self) -> String;

    /// Store `value` under a new store-generated key below `path`.
    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError>;

    /// Delete the subtree at `path`. Absent paths are not an error.
    async fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Atomically replace the value at `path` with `apply(current)`.
    /// Returns the committed value, or `None` when `apply` aborted.
    async fn transaction(
        &self,
        path: &str,
        apply: TransactionFn<'_>,
    ) -> Result<Option<Value>, StoreError>;

    /// Live listener on `path`: yields the current value first, then the new
    /// value whenever something at, above or below `path` changes it.
    async fn subscribe(&self, path: &str) -> Result<StoreWatch, StoreError>;
}

/// Receiving end of a [`RemoteStore::subscribe`] call.
pub struct StoreWatch {
    initial: Option<Option<Value>>,
    rx: broadcast::Receiver<Option<Value>>,
}

impl StoreWatch {
    /// Watch whose channel delivers the current value itself.
    pub fn new(rx: broadcast::Receiver<Option<Value>>) -> Self {
        Self { initial: None, rx }
    }

    /// Watch that yields `current` before anything from the channel.
    pub fn with_initial(current: Option<Value>, rx: broadcast::Receiver<Option<Value>>) -> Self {
        Self {
            initial: Some(current),
            rx,
        }
    }

    /// Wait for the next value. Intermediate values a slow listener missed
    /// are skipped. `None` once the store side has gone away.
    pub async fn next(&mut self) -> Option<Option<Value>> {
        if let Some(current) = self.initial.take() {
            return Some(current);
        }
        loop {
            match self.rx.recv().await {
                Ok(value) => return Some(value),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Store listener lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Split and check a store path. Leading and trailing slashes are ignored;
/// the empty path addresses the root.
pub fn path_segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    trimmed
        .split('/')
        .map(|seg| {
            if seg.is_empty() || seg.contains(['.', '#', '$', '[', ']']) {
                Err(StoreError::InvalidPath(path.to_string()))
            } else {
                Ok(seg)
            }
        })
        .collect()
}

/// Join a path with a child key.
pub fn child_path(parent: &str, key: &str) -> String {
    let parent = parent.trim_end_matches('/');
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}/{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segments() {
        assert_eq!(path_segments("/news/abc/").unwrap(), vec!["news", "abc"]);
        assert!(path_segments("").unwrap().is_empty());
        assert!(path_segments("news//abc").is_err());
        assert!(path_segments("news/a.b").is_err());
        assert!(path_segments("users/$uid").is_err());
    }

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("news", "k1"), "news/k1");
        assert_eq!(child_path("", "news"), "news");
    }
}
