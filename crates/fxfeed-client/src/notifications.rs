//! Live notifications list.
//!
//! Unlike the feed, this list follows the store: a background task copies
//! every change from the listener into a watch channel the screen reads.

use std::sync::Arc;

use fxfeed_core::DomainError;
use fxfeed_core::domain::Notification;
use fxfeed_core::services::NotificationService;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct NotificationsFeed {
    service: Arc<NotificationService>,
    uid: String,
    list: watch::Receiver<Vec<Notification>>,
    task: JoinHandle<()>,
}

impl NotificationsFeed {
    /// Attach a listener for `uid`. Dropping the feed detaches it.
    pub async fn start(service: Arc<NotificationService>, uid: &str) -> Result<Self, DomainError> {
        let mut watch = service.watch(uid).await?;
        let (tx, list) = watch::channel(Vec::new());

        let task = tokio::spawn(async move {
            while let Some(items) = watch.next().await {
                if tx.send(items).is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            service,
            uid: uid.to_string(),
            list,
            task,
        })
    }

    pub fn current(&self) -> Vec<Notification> {
        self.list.borrow().clone()
    }

    pub fn unread_count(&self) -> usize {
        self.list.borrow().iter().filter(|n| !n.read).count()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.list.clone()
    }

    /// The listener delivers the change; nothing to patch locally.
    pub async fn mark_read(&self, id: &str) -> Result<(), DomainError> {
        self.service.mark_read(&self.uid, id).await.map(|_| ())
    }

    pub async fn mark_all_read(&self) -> Result<usize, DomainError> {
        self.service.mark_all_read(&self.uid).await
    }
}

impl Drop for NotificationsFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}
