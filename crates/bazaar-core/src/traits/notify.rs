//! Durable notification inbox.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::id::{NotificationId, UserId};

/// A notification to be persisted for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    /// Recipient.
    pub user_id: UserId,
    /// Coarse category (e.g. `"chat"`).
    pub category: String,
    /// Fine-grained event type (e.g. `"chat.message"`).
    pub event_type: String,
    /// Short title.
    pub title: String,
    /// Body text shown in the inbox.
    pub message: String,
    /// Structured payload for the client.
    pub payload: Option<serde_json::Value>,
    /// Who caused the notification.
    pub actor_id: Option<UserId>,
    /// Kind of the referenced resource (e.g. `"conversation"`).
    pub resource_type: Option<String>,
    /// Id of the referenced resource.
    pub resource_id: Option<uuid::Uuid>,
}

/// Persists notifications for later retrieval by the recipient.
#[async_trait]
pub trait NotificationSink: Send + Sync + std::fmt::Debug + 'static {
    /// Store a notification and return its id.
    async fn create(&self, notification: NewNotification) -> AppResult<NotificationId>;
}
