//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use bazaar_core::traits::notify::NewNotification;
use bazaar_core::types::id::{NotificationId, UserId};

/// A durable notification stored for a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The recipient user.
    pub user_id: UserId,
    /// Notification category.
    pub category: String,
    /// Event type that triggered this notification.
    pub event_type: String,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub message: String,
    /// Additional structured data (JSON).
    pub payload: Option<serde_json::Value>,
    /// The user who triggered the action (if applicable).
    pub actor_id: Option<UserId>,
    /// Resource type involved (if applicable).
    pub resource_type: Option<String>,
    /// Resource ID involved (if applicable).
    pub resource_id: Option<Uuid>,
    /// Whether the user has read this notification.
    pub is_read: bool,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Materialise a new, unread notification.
    pub fn from_new(new: NewNotification) -> Self {
        Self {
            id: NotificationId::new(),
            user_id: new.user_id,
            category: new.category,
            event_type: new.event_type,
            title: new.title,
            message: new.message,
            payload: new.payload,
            actor_id: new.actor_id,
            resource_type: new.resource_type,
            resource_id: new.resource_id,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}
