//! Domain services - one per entity family, each a thin layer of typed
//! reads and writes over the remote store.

mod menu;
mod news;
mod notification;
mod profile;

pub use menu::MenuService;
pub use news::NewsService;
pub use notification::{NotificationService, NotificationWatch};
pub use profile::ProfileService;

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DomainError;
use crate::ports::RemoteStore;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read and decode the value at `path`.
pub(crate) async fn read<T: DeserializeOwned>(
    store: &dyn RemoteStore,
    path: &str,
) -> Result<Option<T>, DomainError> {
    match store.get(path).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Decode each child of a keyed collection, skipping the ones that do not
/// match the expected shape.
pub(crate) fn decode_children<T: DeserializeOwned>(
    collection: Option<Value>,
    entity: &'static str,
) -> Vec<(String, T)> {
    let children = match collection {
        Some(Value::Object(children)) => children,
        Some(_) => {
            tracing::warn!(entity, "Collection is not keyed; treating as empty");
            return Vec::new();
        }
        None => return Vec::new(),
    };

    children
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<T>(value) {
            Ok(item) => Some((key, item)),
            Err(e) => {
                tracing::warn!(entity, key = %key, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect()
}

/// Typed read-modify-write on top of [`RemoteStore::transaction`].
///
/// `apply` sees the decoded current value and either returns the value to
/// commit or an error, which aborts the transaction and is returned as-is.
pub(crate) async fn transact<T, F>(
    store: &dyn RemoteStore,
    path: &str,
    apply: F,
) -> Result<T, DomainError>
where
    T: Serialize + DeserializeOwned + Send,
    F: Fn(Option<T>) -> Result<T, DomainError> + Send + Sync,
{
    let rejection: Mutex<Option<DomainError>> = Mutex::new(None);
    let committed: Mutex<Option<T>> = Mutex::new(None);

    let raw = |current: Option<&Value>| -> Option<Value> {
        let decoded = match current.cloned().map(serde_json::from_value::<T>).transpose() {
            Ok(decoded) => decoded,
            Err(e) => {
                *lock(&rejection) = Some(e.into());
                return None;
            }
        };
        let next = match apply(decoded) {
            Ok(next) => next,
            Err(e) => {
                *lock(&rejection) = Some(e);
                return None;
            }
        };
        match serde_json::to_value(&next) {
            Ok(value) => {
                *lock(&rejection) = None;
                *lock(&committed) = Some(next);
                Some(value)
            }
            Err(e) => {
                *lock(&rejection) = Some(e.into());
                None
            }
        }
    };

    match store.transaction(path, &raw).await? {
        Some(_) => lock(&committed)
            .take()
            .ok_or_else(|| DomainError::Conflict(format!("transaction on '{path}' lost its value"))),
        None => Err(lock(&rejection)
            .take()
            .unwrap_or_else(|| DomainError::Conflict(format!("transaction on '{path}' aborted")))),
    }
}

/// Newest-first by push key, which encodes creation time.
pub(crate) fn newest_first<T>(mut items: Vec<(String, T)>) -> Vec<(String, T)> {
    items.sort_by(|a, b| b.0.cmp(&a.0));
    items
}
