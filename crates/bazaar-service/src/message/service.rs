//! Message persistence, read state, and history.

use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use tracing::{debug, error, info};

use bazaar_core::error::AppError;
use bazaar_core::result::AppResult;
use bazaar_core::types::id::{ConversationId, MessageId, UserId};
use bazaar_core::types::pagination::{PageRequest, PageResponse};
use bazaar_database::repositories::MessageRepository;
use bazaar_entity::conversation::Conversation;
use bazaar_entity::message::{Message, MessageKind, ReadReceipt};

use super::validation::validate_content;
use crate::conversation::ConversationService;

/// A message as submitted by its sender.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    /// Body text.
    pub content: String,
    /// What the message carries.
    pub kind: MessageKind,
    /// Attachment location, if any.
    pub attachment_url: Option<String>,
}

impl OutgoingMessage {
    /// A plain text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: MessageKind::Text,
            attachment_url: None,
        }
    }
}

/// Stores messages and tracks their read state.
#[derive(Debug, Clone)]
pub struct MessageService {
    /// Participant gate.
    conversations: ConversationService,
    /// Message storage.
    repo: Arc<dyn MessageRepository>,
    /// Maximum body length in characters.
    max_content_length: usize,
}

impl MessageService {
    /// Creates a new message service.
    pub fn new(
        conversations: ConversationService,
        repo: Arc<dyn MessageRepository>,
        max_content_length: usize,
    ) -> Self {
        Self {
            conversations,
            repo,
            max_content_length,
        }
    }

    /// Append a message after checking the sender participates.
    pub async fn append(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        outgoing: OutgoingMessage,
    ) -> AppResult<Message> {
        let conversation = self
            .conversations
            .ensure_participant(conversation_id, sender_id)
            .await?;
        self.append_to(&conversation, sender_id, outgoing).await
    }

    /// Append a message to a conversation the caller already loaded.
    ///
    /// The stored message is unread and the conversation's recency marker
    /// moves to its `created_at` in the same write.
    pub async fn append_to(
        &self,
        conversation: &Conversation,
        sender_id: UserId,
        outgoing: OutgoingMessage,
    ) -> AppResult<Message> {
        if !conversation.is_active || !conversation.involves(sender_id) {
            return Err(AppError::access_denied(
                "You are not a participant of this conversation",
            ));
        }
        validate_content(
            &outgoing.content,
            outgoing.attachment_url.as_deref(),
            self.max_content_length,
        )?;

        let message = Message::new(
            conversation.id,
            sender_id,
            outgoing.content,
            outgoing.kind,
            outgoing.attachment_url,
        );

        let stored = self.repo.append(message).await.inspect_err(|e| {
            error!(
                conversation_id = %conversation.id,
                sender_id = %sender_id,
                error = %e,
                "Failed to persist message"
            );
        })?;

        debug!(
            message_id = %stored.id,
            conversation_id = %stored.conversation_id,
            kind = %stored.kind,
            "Message stored"
        );
        Ok(stored)
    }

    /// Mark every message the reader received in the conversation as read.
    ///
    /// Returns the messages that changed state; empty when nothing was unread.
    pub async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader: UserId,
    ) -> AppResult<Vec<ReadReceipt>> {
        self.conversations
            .ensure_participant(conversation_id, reader)
            .await?;

        let receipts = self
            .repo
            .mark_read(conversation_id, reader, Utc::now().trunc_subsecs(6))
            .await?;

        if !receipts.is_empty() {
            info!(
                conversation_id = %conversation_id,
                reader = %reader,
                count = receipts.len(),
                "Messages marked read"
            );
        }
        Ok(receipts)
    }

    /// Unread messages addressed to the user across their conversations.
    pub async fn unread_count_for(&self, user_id: UserId) -> AppResult<u64> {
        self.repo.unread_count_for(user_id).await
    }

    /// Conversation history for a participant, oldest first.
    pub async fn page(
        &self,
        conversation_id: ConversationId,
        reader: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Message>> {
        self.conversations
            .ensure_participant(conversation_id, reader)
            .await?;
        self.repo.page(conversation_id, page).await
    }

    /// Look up a single message.
    pub async fn find(&self, message_id: MessageId) -> AppResult<Message> {
        self.repo
            .find_by_id(message_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Message {message_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::error::ErrorKind;
    use bazaar_database::memory::MemoryStore;

    struct Fixture {
        store: MemoryStore,
        conversations: ConversationService,
        messages: MessageService,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let conversations = ConversationService::new(Arc::new(store.clone()));
        let messages = MessageService::new(conversations.clone(), Arc::new(store.clone()), 200);
        Fixture {
            store,
            conversations,
            messages,
        }
    }

    #[tokio::test]
    async fn test_append_requires_participant() {
        let fx = fixture();
        let (a, b) = (UserId::new(), UserId::new());
        let conversation = fx
            .conversations
            .resolve_or_create(a, b, None, None)
            .await
            .expect("create");

        let err = fx
            .messages
            .append(conversation.id, UserId::new(), OutgoingMessage::text("hi"))
            .await
            .expect_err("outsider");
        assert_eq!(err.kind, ErrorKind::AccessDenied);
        assert_eq!(fx.store.message_count(), 0);
    }

    #[tokio::test]
    async fn test_append_validates_content() {
        let fx = fixture();
        let (a, b) = (UserId::new(), UserId::new());
        let conversation = fx
            .conversations
            .resolve_or_create(a, b, None, None)
            .await
            .expect("create");

        let err = fx
            .messages
            .append(conversation.id, a, OutgoingMessage::text("  "))
            .await
            .expect_err("blank");
        assert_eq!(err.kind, ErrorKind::Validation);

        let too_long = "x".repeat(201);
        let err = fx
            .messages
            .append(conversation.id, a, OutgoingMessage::text(too_long))
            .await
            .expect_err("too long");
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_append_advances_conversation_recency() {
        let fx = fixture();
        let (a, b) = (UserId::new(), UserId::new());
        let conversation = fx
            .conversations
            .resolve_or_create(a, b, None, None)
            .await
            .expect("create");

        let message = fx
            .messages
            .append(conversation.id, a, OutgoingMessage::text("hello"))
            .await
            .expect("append");
        assert!(!message.is_read);

        let reloaded = fx.conversations.get(conversation.id, b).await.expect("get");
        assert_eq!(reloaded.last_message_at, message.created_at.max(conversation.created_at));
    }

    #[tokio::test]
    async fn test_page_is_append_ordered() {
        let fx = fixture();
        let (a, b) = (UserId::new(), UserId::new());
        let conversation = fx
            .conversations
            .resolve_or_create(a, b, None, None)
            .await
            .expect("create");

        let mut sent = Vec::new();
        for i in 0..12 {
            let sender = if i % 3 == 0 { b } else { a };
            let m = fx
                .messages
                .append(conversation.id, sender, OutgoingMessage::text(format!("m{i}")))
                .await
                .expect("append");
            sent.push(m.id);
        }

        let first = fx
            .messages
            .page(conversation.id, a, &PageRequest::new(1, 5))
            .await
            .expect("page 1");
        let rest = fx
            .messages
            .page(conversation.id, a, &PageRequest::new(2, 100))
            .await
            .expect("page 2");
        assert_eq!(first.total_items, 12);
        let seen: Vec<MessageId> = first.items.iter().map(|m| m.id).collect();
        assert_eq!(seen, sent[..5].to_vec());

        let all = fx
            .messages
            .page(conversation.id, b, &PageRequest::new(1, 100))
            .await
            .expect("all");
        let all_ids: Vec<MessageId> = all.items.iter().map(|m| m.id).collect();
        assert_eq!(all_ids, sent);
        assert!(rest.items.is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent() {
        let fx = fixture();
        let (a, b) = (UserId::new(), UserId::new());
        let conversation = fx
            .conversations
            .resolve_or_create(a, b, None, None)
            .await
            .expect("create");
        let sent = fx
            .messages
            .append(conversation.id, a, OutgoingMessage::text("hello"))
            .await
            .expect("append");

        let first = fx.messages.mark_read(conversation.id, b).await.expect("read");
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].message_id, sent.id);
        let stamped = fx.messages.find(sent.id).await.expect("find").read_at;
        assert!(stamped.is_some());

        let second = fx.messages.mark_read(conversation.id, b).await.expect("read again");
        assert!(second.is_empty());
        let after = fx.messages.find(sent.id).await.expect("find").read_at;
        assert_eq!(stamped, after);
    }

    #[tokio::test]
    async fn test_sender_reading_own_messages_flips_nothing() {
        let fx = fixture();
        let (a, b) = (UserId::new(), UserId::new());
        let conversation = fx
            .conversations
            .resolve_or_create(a, b, None, None)
            .await
            .expect("create");
        fx.messages
            .append(conversation.id, a, OutgoingMessage::text("hello"))
            .await
            .expect("append");

        let receipts = fx.messages.mark_read(conversation.id, a).await.expect("read");
        assert!(receipts.is_empty());
        assert_eq!(fx.messages.unread_count_for(b).await.expect("count"), 1);
    }

    #[tokio::test]
    async fn test_unread_counts_per_direction() {
        let fx = fixture();
        let (a, b) = (UserId::new(), UserId::new());
        let conversation = fx
            .conversations
            .resolve_or_create(a, b, None, None)
            .await
            .expect("create");

        for _ in 0..3 {
            fx.messages
                .append(conversation.id, b, OutgoingMessage::text("to a"))
                .await
                .expect("b->a");
        }
        for _ in 0..2 {
            fx.messages
                .append(conversation.id, a, OutgoingMessage::text("to b"))
                .await
                .expect("a->b");
        }

        assert_eq!(fx.messages.unread_count_for(a).await.expect("a"), 3);
        assert_eq!(fx.messages.unread_count_for(b).await.expect("b"), 2);

        fx.messages.mark_read(conversation.id, a).await.expect("read");
        assert_eq!(fx.messages.unread_count_for(a).await.expect("a"), 0);
        assert_eq!(fx.messages.unread_count_for(b).await.expect("b"), 2);
    }

    #[tokio::test]
    async fn test_find_unknown_message_is_not_found() {
        let fx = fixture();
        let err = fx.messages.find(MessageId::new()).await.expect_err("missing");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_reported() {
        let fx = fixture();
        let (a, b) = (UserId::new(), UserId::new());
        let conversation = fx
            .conversations
            .resolve_or_create(a, b, None, None)
            .await
            .expect("create");
        fx.store.set_fail_writes(true);

        let err = fx
            .messages
            .append(conversation.id, a, OutgoingMessage::text("hello"))
            .await
            .expect_err("write fails");
        assert_eq!(err.kind, ErrorKind::Persistence);
    }
}
