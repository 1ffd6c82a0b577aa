//! PostgreSQL conversation repository.

use async_trait::async_trait;
use sqlx::PgPool;

use bazaar_core::error::{AppError, ErrorKind};
use bazaar_core::result::AppResult;
use bazaar_core::types::id::{ConversationId, UserId};
use bazaar_core::types::pagination::{PageRequest, PageResponse};
use bazaar_entity::conversation::{Conversation, ConversationKey};

use super::ConversationRepository;

/// Conversation repository backed by the `conversations` table.
///
/// The partial unique index `uq_conversations_active_pair` guarantees at
/// most one active row per canonical pair and product context.
#[derive(Debug, Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    /// Create a new conversation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    async fn find_active(&self, key: &ConversationKey) -> AppResult<Option<Conversation>> {
        sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations \
             WHERE participant_a = $1 AND participant_b = $2 \
             AND product_id IS NOT DISTINCT FROM $3 AND is_active",
        )
        .bind(key.participant_a)
        .bind(key.participant_b)
        .bind(key.product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to find conversation", e)
        })
    }

    async fn insert_or_get(&self, conversation: Conversation) -> AppResult<Conversation> {
        let key = conversation.key();
        let inserted = sqlx::query_as::<_, Conversation>(
            "INSERT INTO conversations \
             (id, participant_a, participant_b, product_id, order_id, created_at, last_message_at, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT DO NOTHING RETURNING *",
        )
        .bind(conversation.id)
        .bind(conversation.participant_a)
        .bind(conversation.participant_b)
        .bind(conversation.product_id)
        .bind(conversation.order_id)
        .bind(conversation.created_at)
        .bind(conversation.last_message_at)
        .bind(conversation.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to create conversation", e)
        })?;

        if let Some(row) = inserted {
            return Ok(row);
        }

        // Lost the race: another writer holds the key.
        self.find_active(&key).await?.ok_or_else(|| {
            AppError::persistence("Conversation insert conflicted but no active row was found")
        })
    }

    async fn find_by_id(&self, id: ConversationId) -> AppResult<Option<Conversation>> {
        sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Persistence, "Failed to find conversation", e)
            })
    }

    async fn list_active_for_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Conversation>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM conversations \
             WHERE (participant_a = $1 OR participant_b = $1) AND is_active",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to count conversations", e)
        })?;

        let conversations = sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations \
             WHERE (participant_a = $1 OR participant_b = $1) AND is_active \
             ORDER BY last_message_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Persistence, "Failed to list conversations", e)
        })?;

        Ok(PageResponse::new(
            conversations,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn deactivate(&self, id: ConversationId) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE conversations SET is_active = FALSE WHERE id = $1 AND is_active")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Persistence,
                        "Failed to deactivate conversation",
                        e,
                    )
                })?;
        Ok(result.rows_affected() > 0)
    }
}
