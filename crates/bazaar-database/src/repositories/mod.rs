//! Repository contracts and their PostgreSQL implementations.
//!
//! Services depend on the traits only, so the same service code runs
//! against PostgreSQL in production and the in-memory store in tests.

pub mod conversation;
pub mod message;
pub mod notification;
pub mod product;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use bazaar_core::result::AppResult;
use bazaar_core::types::id::{ConversationId, MessageId, UserId};
use bazaar_core::types::pagination::{PageRequest, PageResponse};
use bazaar_entity::conversation::{Conversation, ConversationKey};
use bazaar_entity::message::{Message, ReadReceipt};

pub use conversation::PgConversationRepository;
pub use message::PgMessageRepository;
pub use notification::PgNotificationSink;
pub use product::PgProductCatalog;

/// Storage for conversations.
#[async_trait]
pub trait ConversationRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Find the active conversation for a canonical key.
    async fn find_active(&self, key: &ConversationKey) -> AppResult<Option<Conversation>>;

    /// Insert a conversation, or return the active one that already holds its key.
    ///
    /// Uniqueness is enforced by storage, so concurrent callers with the same
    /// key all receive the same row.
    async fn insert_or_get(&self, conversation: Conversation) -> AppResult<Conversation>;

    /// Find a conversation by id, active or not.
    async fn find_by_id(&self, id: ConversationId) -> AppResult<Option<Conversation>>;

    /// Active conversations of a user, most recent activity first.
    async fn list_active_for_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Conversation>>;

    /// Mark a conversation inactive. Returns `false` if it was already inactive or unknown.
    async fn deactivate(&self, id: ConversationId) -> AppResult<bool>;
}

/// Storage for messages.
#[async_trait]
pub trait MessageRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a message and advance its conversation's `last_message_at`
    /// in the same transaction.
    async fn append(&self, message: Message) -> AppResult<Message>;

    /// Find a message by id.
    async fn find_by_id(&self, id: MessageId) -> AppResult<Option<Message>>;

    /// Flip every unread message in the conversation not sent by `reader`.
    ///
    /// Returns only the messages that changed state, so a repeated call
    /// returns an empty list.
    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader: UserId,
        read_at: DateTime<Utc>,
    ) -> AppResult<Vec<ReadReceipt>>;

    /// Unread messages addressed to a user across their active conversations.
    async fn unread_count_for(&self, user_id: UserId) -> AppResult<u64>;

    /// Non-deleted messages of a conversation, oldest first.
    async fn page(
        &self,
        conversation_id: ConversationId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Message>>;
}
