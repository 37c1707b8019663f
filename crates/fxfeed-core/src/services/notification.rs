//! In-app notifications under `notifications/{uid}/{id}`.
//!
//! Unlike the feed, this list is meant to be consumed live through
//! [`NotificationService::watch`].

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use super::{decode_children, transact};
use crate::domain::{Notification, NotificationDraft};
use crate::error::DomainError;
use crate::paths;
use crate::ports::{RemoteStore, StoreWatch};

pub struct NotificationService {
    store: Arc<dyn RemoteStore>,
}

fn into_sorted_list(collection: Option<Value>) -> Vec<Notification> {
    let mut items: Vec<Notification> = decode_children::<Notification>(collection, "Notification")
        .into_iter()
        .map(|(id, n)| Notification { id, ..n })
        .collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    items
}

impl NotificationService {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Newest first.
    pub async fn list(&self, uid: &str) -> Result<Vec<Notification>, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        let collection = self.store.get(&paths::notifications(uid)).await?;
        Ok(into_sorted_list(collection))
    }

    pub async fn unread_count(&self, uid: &str) -> Result<usize, DomainError> {
        Ok(self.list(uid).await?.iter().filter(|n| !n.read).count())
    }

    pub async fn notify(&self, uid: &str, draft: NotificationDraft) -> Result<Notification, DomainError> {
        draft.validate()?;
        let uid = paths::check_key("userId", uid)?;
        let notification = Notification {
            id: String::new(),
            title: draft.title.trim().to_string(),
            body: draft.body,
            kind: draft.kind,
            read: false,
            created_at: Utc::now(),
        };

        let id = self
            .store
            .push(&paths::notifications(uid), serde_json::to_value(&notification)?)
            .await?;
        tracing::debug!(user_id = %uid, notification_id = %id, kind = ?notification.kind, "Notification sent");
        Ok(Notification { id, ..notification })
    }

    pub async fn mark_read(&self, uid: &str, id: &str) -> Result<Notification, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        let id = paths::check_key("id", id)?;

        let updated = transact(
            self.store.as_ref(),
            &paths::notification(uid, id),
            |current: Option<Notification>| {
                let mut n = current.ok_or_else(|| DomainError::not_found("Notification", id))?;
                n.read = true;
                Ok(n)
            },
        )
        .await?;
        Ok(Notification {
            id: id.to_string(),
            ..updated
        })
    }

    /// Returns how many were unread.
    pub async fn mark_all_read(&self, uid: &str) -> Result<usize, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        let path = paths::notifications(uid);

        let before = self.store.get(&path).await?;
        let unread: Vec<String> = into_sorted_list(before)
            .into_iter()
            .filter(|n| !n.read)
            .map(|n| n.id)
            .collect();
        if unread.is_empty() {
            return Ok(0);
        }

        let fields = unread
            .iter()
            .map(|id| (format!("{id}/read"), Value::Bool(true)))
            .collect();
        self.store.update(&path, fields).await?;
        Ok(unread.len())
    }

    pub async fn watch(&self, uid: &str) -> Result<NotificationWatch, DomainError> {
        let uid = paths::check_key("userId", uid)?;
        let inner = self.store.subscribe(&paths::notifications(uid)).await?;
        Ok(NotificationWatch { inner })
    }
}

/// Live, decoded view of one user's notifications.
pub struct NotificationWatch {
    inner: StoreWatch,
}

impl NotificationWatch {
    /// The full list after the next change; `None` when the listener closed.
    pub async fn next(&mut self) -> Option<Vec<Notification>> {
        self.inner.next().await.map(into_sorted_list)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::NotificationKind;
    use crate::store::InMemoryStore;

    fn service() -> NotificationService {
        NotificationService::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn test_notify_and_list() {
        let notifications = service();
        notifications
            .notify("u1", NotificationDraft::new(NotificationKind::System, "Welcome", ""))
            .await
            .unwrap();
        let second = notifications
            .notify("u1", NotificationDraft::new(NotificationKind::Kyc, "Verified", "ok"))
            .await
            .unwrap();

        let list = notifications.list("u1").await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, second.id);
        assert_eq!(notifications.unread_count("u1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_mark_read() {
        let notifications = service();
        let n = notifications
            .notify("u1", NotificationDraft::new(NotificationKind::News, "Fed", ""))
            .await
            .unwrap();

        let read = notifications.mark_read("u1", &n.id).await.unwrap();
        assert!(read.read);
        assert_eq!(notifications.unread_count("u1").await.unwrap(), 0);

        let err = notifications.mark_read("u1", "missing").await.unwrap_err();
        assert_eq!(err.to_string(), "Notification not found");
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let notifications = service();
        for title in ["a", "b", "c"] {
            notifications
                .notify("u1", NotificationDraft::new(NotificationKind::System, title, ""))
                .await
                .unwrap();
        }

        assert_eq!(notifications.mark_all_read("u1").await.unwrap(), 3);
        assert_eq!(notifications.unread_count("u1").await.unwrap(), 0);
        assert_eq!(notifications.mark_all_read("u1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_watch_delivers_updates() {
        let notifications = service();
        let mut watch = notifications.watch("u1").await.unwrap();
        assert_eq!(watch.next().await, Some(Vec::new()));

        notifications
            .notify("u1", NotificationDraft::new(NotificationKind::PriceAlert, "EUR/USD > 1.10", ""))
            .await
            .unwrap();

        let list = tokio::time::timeout(Duration::from_secs(1), watch.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, "EUR/USD > 1.10");
    }
}
