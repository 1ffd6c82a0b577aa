//! PostgreSQL notification sink.

use async_trait::async_trait;
use sqlx::PgPool;

use bazaar_core::error::{AppError, ErrorKind};
use bazaar_core::result::AppResult;
use bazaar_core::traits::notify::{NewNotification, NotificationSink};
use bazaar_core::types::id::NotificationId;

/// Writes notifications into the shared `notifications` table.
#[derive(Debug, Clone)]
pub struct PgNotificationSink {
    pool: PgPool,
}

impl PgNotificationSink {
    /// Create a new notification sink.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for PgNotificationSink {
    async fn create(&self, notification: NewNotification) -> AppResult<NotificationId> {
        sqlx::query_scalar::<_, NotificationId>(
            "INSERT INTO notifications \
             (id, user_id, category, event_type, title, message, payload, actor_id, resource_type, resource_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
        )
        .bind(NotificationId::new())
        .bind(notification.user_id)
        .bind(&notification.category)
        .bind(&notification.event_type)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.payload)
        .bind(notification.actor_id)
        .bind(&notification.resource_type)
        .bind(notification.resource_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to create notification", e)
        })
    }
}
