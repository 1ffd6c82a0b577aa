//! Recording notification sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use bazaar_core::error::AppError;
use bazaar_core::result::AppResult;
use bazaar_core::traits::notify::{NewNotification, NotificationSink};
use bazaar_core::types::id::{NotificationId, UserId};
use bazaar_entity::notification::Notification;

/// Keeps notifications in memory so they can be inspected.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotificationSink {
    notifications: Arc<RwLock<Vec<Notification>>>,
    failing: Arc<AtomicBool>,
    delay: Option<Duration>,
}

impl MemoryNotificationSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait this long before storing each notification.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make every subsequent `create` fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All notifications stored for a user, oldest first.
    pub async fn for_user(&self, user_id: UserId) -> Vec<Notification> {
        self.notifications
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Total number of stored notifications.
    pub async fn len(&self) -> usize {
        self.notifications.read().await.len()
    }

    /// Whether nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.notifications.read().await.is_empty()
    }
}

#[async_trait]
impl NotificationSink for MemoryNotificationSink {
    async fn create(&self, notification: NewNotification) -> AppResult<NotificationId> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::external("Notification inbox unavailable"));
        }

        let stored = Notification::from_new(notification);
        let id = stored.id;
        self.notifications.write().await.push(stored);
        Ok(id)
    }
}
