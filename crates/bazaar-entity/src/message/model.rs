//! Message entity model.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use bazaar_core::types::id::{ConversationId, MessageId, UserId};

use super::MessageKind;

/// A single chat message.
///
/// Within a conversation, messages are ordered by `created_at` with ties
/// broken by `id`. `created_at` is assigned once and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Unique, time-ordered message identifier.
    pub id: MessageId,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Author (one of the two participants).
    pub sender_id: UserId,
    /// Message body.
    pub content: String,
    /// What the message carries.
    pub kind: MessageKind,
    /// Attachment location for image/file messages.
    pub attachment_url: Option<String>,
    /// Whether the recipient has read the message. Never goes back to `false`.
    pub is_read: bool,
    /// Set once, on the first read.
    pub read_at: Option<DateTime<Utc>>,
    /// Whether the sender edited the message.
    pub is_edited: bool,
    /// Soft-deleted messages are filtered from history.
    pub is_deleted: bool,
    /// When the message was accepted.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new unread message stamped with the current time.
    pub fn new(
        conversation_id: ConversationId,
        sender_id: UserId,
        content: impl Into<String>,
        kind: MessageKind,
        attachment_url: Option<String>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            sender_id,
            content: content.into(),
            kind,
            attachment_url,
            is_read: false,
            read_at: None,
            is_edited: false,
            is_deleted: false,
            // Storage keeps microseconds; truncate so in-memory and stored values agree.
            created_at: Utc::now().trunc_subsecs(6),
        }
    }

    /// Whether this message counts as unread for `user_id`.
    pub fn is_unread_for(&self, user_id: UserId) -> bool {
        !self.is_read && self.sender_id != user_id
    }

    /// Ordering key within a conversation.
    pub fn order_key(&self) -> (DateTime<Utc>, MessageId) {
        (self.created_at, self.id)
    }
}

/// A message that just transitioned from unread to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ReadReceipt {
    /// The message that was read.
    pub message_id: MessageId,
    /// Its conversation.
    pub conversation_id: ConversationId,
    /// Its author, who should be told about the read.
    pub sender_id: UserId,
    /// When it was read.
    pub read_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message_is_unread() {
        let sender = UserId::new();
        let message = Message::new(ConversationId::new(), sender, "hi", MessageKind::Text, None);
        assert!(!message.is_read);
        assert!(message.read_at.is_none());
        assert!(!message.is_unread_for(sender));
        assert!(message.is_unread_for(UserId::new()));
    }
}
