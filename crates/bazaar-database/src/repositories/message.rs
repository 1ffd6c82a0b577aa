//! PostgreSQL message repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::error::{AppError, ErrorKind};
use bazaar_core::result::AppResult;
use bazaar_core::types::id::{ConversationId, MessageId, UserId};
use bazaar_core::types::pagination::{PageRequest, PageResponse};
use bazaar_entity::message::{Message, ReadReceipt};

use super::MessageRepository;

/// Message repository backed by the `messages` table.
#[derive(Debug, Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Create a new message repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn append(&self, message: Message) -> AppResult<Message> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to begin transaction", e)
        })?;

        let stored = sqlx::query_as::<_, Message>(
            "INSERT INTO messages \
             (id, conversation_id, sender_id, content, kind, attachment_url, \
              is_read, read_at, is_edited, is_deleted, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
        )
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(message.kind)
        .bind(&message.attachment_url)
        .bind(message.is_read)
        .bind(message.read_at)
        .bind(message.is_edited)
        .bind(message.is_deleted)
        .bind(message.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to insert message", e))?;

        let advanced = sqlx::query(
            "UPDATE conversations SET last_message_at = GREATEST(last_message_at, $2) \
             WHERE id = $1",
        )
        .bind(stored.conversation_id)
        .bind(stored.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Persistence,
                "Failed to advance conversation recency",
                e,
            )
        })?;

        if advanced.rows_affected() == 0 {
            return Err(AppError::persistence(format!(
                "Conversation {} disappeared during append",
                stored.conversation_id
            )));
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to commit message", e)
        })?;

        Ok(stored)
    }

    async fn find_by_id(&self, id: MessageId) -> AppResult<Option<Message>> {
        sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to find message", e))
    }

    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader: UserId,
        read_at: DateTime<Utc>,
    ) -> AppResult<Vec<ReadReceipt>> {
        // Rows already read are filtered out again after a concurrent commit,
        // so each message is returned by exactly one caller.
        sqlx::query_as::<_, ReadReceipt>(
            "UPDATE messages SET is_read = TRUE, read_at = $3 \
             WHERE conversation_id = $1 AND sender_id <> $2 AND is_read = FALSE \
             RETURNING id AS message_id, conversation_id, sender_id, read_at",
        )
        .bind(conversation_id)
        .bind(reader)
        .bind(read_at)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to mark messages read", e)
        })
    }

    async fn unread_count_for(&self, user_id: UserId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages m \
             JOIN conversations c ON c.id = m.conversation_id \
             WHERE (c.participant_a = $1 OR c.participant_b = $1) AND c.is_active \
             AND m.sender_id <> $1 AND m.is_read = FALSE AND m.is_deleted = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to count unread", e))?;
        Ok(count.max(0) as u64)
    }

    async fn page(
        &self,
        conversation_id: ConversationId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Message>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE conversation_id = $1 AND is_deleted = FALSE",
        )
        .bind(conversation_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to count messages", e))?;

        let messages = sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE conversation_id = $1 AND is_deleted = FALSE \
             ORDER BY created_at ASC, id ASC LIMIT $2 OFFSET $3",
        )
        .bind(conversation_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Persistence, "Failed to list messages", e))?;

        Ok(PageResponse::new(
            messages,
            page.page,
            page.page_size,
            total as u64,
        ))
    }
}
