//! In-memory conversation and message store built on `DashMap`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use bazaar_core::error::AppError;
use bazaar_core::result::AppResult;
use bazaar_core::types::id::{ConversationId, MessageId, UserId};
use bazaar_core::types::pagination::{PageRequest, PageResponse};
use bazaar_entity::conversation::{Conversation, ConversationKey};
use bazaar_entity::message::{Message, ReadReceipt};

use crate::repositories::{ConversationRepository, MessageRepository};

/// Shared tables of the store.
///
/// Lock order when more than one map is held:
/// `active_keys` → `conversations` → `messages` → `message_index`.
#[derive(Debug)]
struct Tables {
    conversations: DashMap<ConversationId, Conversation>,
    active_keys: DashMap<ConversationKey, ConversationId>,
    messages: DashMap<ConversationId, Vec<Message>>,
    message_index: DashMap<MessageId, ConversationId>,
    enforce_unique: bool,
    fail_writes: AtomicBool,
}

/// In-memory store implementing [`ConversationRepository`] and [`MessageRepository`].
///
/// Cloning is cheap; clones share the same tables.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

impl MemoryStore {
    /// Create an empty store that enforces one active conversation per key.
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Create an empty store with no uniqueness rule on active conversations.
    ///
    /// Mirrors a database without the partial unique index, where
    /// concurrent first contacts may create duplicate conversations.
    pub fn without_unique_index() -> Self {
        Self::build(false)
    }

    fn build(enforce_unique: bool) -> Self {
        Self {
            tables: Arc::new(Tables {
                conversations: DashMap::new(),
                active_keys: DashMap::new(),
                messages: DashMap::new(),
                message_index: DashMap::new(),
                enforce_unique,
                fail_writes: AtomicBool::new(false),
            }),
        }
    }

    /// Make every subsequent write fail with a persistence error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.tables.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of conversations ever stored, active or not.
    pub fn conversation_count(&self) -> usize {
        self.tables.conversations.len()
    }

    /// Active conversations matching a key.
    pub fn active_count(&self, key: &ConversationKey) -> usize {
        self.tables
            .conversations
            .iter()
            .filter(|c| c.is_active && c.value().key() == *key)
            .count()
    }

    /// Number of messages stored across all conversations.
    pub fn message_count(&self) -> usize {
        self.tables.message_index.len()
    }

    fn check_writable(&self) -> AppResult<()> {
        if self.tables.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::persistence("Store is rejecting writes"));
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationRepository for MemoryStore {
    async fn find_active(&self, key: &ConversationKey) -> AppResult<Option<Conversation>> {
        Ok(self
            .tables
            .conversations
            .iter()
            .filter(|c| c.is_active && c.value().key() == *key)
            .min_by_key(|c| (c.created_at, c.id))
            .map(|c| c.value().clone()))
    }

    async fn insert_or_get(&self, conversation: Conversation) -> AppResult<Conversation> {
        self.check_writable()?;

        if !self.tables.enforce_unique {
            self.tables
                .conversations
                .insert(conversation.id, conversation.clone());
            return Ok(conversation);
        }

        match self.tables.active_keys.entry(conversation.key()) {
            Entry::Occupied(slot) => {
                let existing_id = *slot.get();
                debug!(conversation_id = %existing_id, "Active conversation already holds key");
                self.tables
                    .conversations
                    .get(&existing_id)
                    .map(|c| c.value().clone())
                    .ok_or_else(|| AppError::persistence("Active key points at a missing conversation"))
            }
            Entry::Vacant(slot) => {
                self.tables
                    .conversations
                    .insert(conversation.id, conversation.clone());
                slot.insert(conversation.id);
                Ok(conversation)
            }
        }
    }

    async fn find_by_id(&self, id: ConversationId) -> AppResult<Option<Conversation>> {
        Ok(self
            .tables
            .conversations
            .get(&id)
            .map(|c| c.value().clone()))
    }

    async fn list_active_for_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Conversation>> {
        let mut matching: Vec<Conversation> = self
            .tables
            .conversations
            .iter()
            .filter(|c| c.is_active && c.involves(user_id))
            .map(|c| c.value().clone())
            .collect();
        matching.sort_by(|a, b| {
            b.last_message_at
                .cmp(&a.last_message_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(PageResponse::from_ordered(matching, page))
    }

    async fn deactivate(&self, id: ConversationId) -> AppResult<bool> {
        self.check_writable()?;

        let key = match self.tables.conversations.get(&id) {
            Some(c) if c.is_active => c.value().key(),
            _ => return Ok(false),
        };

        self.tables.active_keys.remove_if(&key, |_, held| *held == id);

        match self.tables.conversations.get_mut(&id) {
            Some(mut c) if c.is_active => {
                c.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn append(&self, message: Message) -> AppResult<Message> {
        self.check_writable()?;

        // Holding the conversation entry makes the insert and the recency bump
        // one step for every other writer of this conversation.
        let mut conversation = self
            .tables
            .conversations
            .get_mut(&message.conversation_id)
            .ok_or_else(|| {
                AppError::persistence(format!(
                    "Conversation {} does not exist",
                    message.conversation_id
                ))
            })?;

        if message.created_at > conversation.last_message_at {
            conversation.last_message_at = message.created_at;
        }
        self.tables
            .messages
            .entry(message.conversation_id)
            .or_default()
            .push(message.clone());
        self.tables
            .message_index
            .insert(message.id, message.conversation_id);
        drop(conversation);

        Ok(message)
    }

    async fn find_by_id(&self, id: MessageId) -> AppResult<Option<Message>> {
        let conversation_id = match self.tables.message_index.get(&id) {
            Some(entry) => *entry.value(),
            None => return Ok(None),
        };
        Ok(self
            .tables
            .messages
            .get(&conversation_id)
            .and_then(|list| list.iter().find(|m| m.id == id).cloned()))
    }

    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        reader: UserId,
        read_at: DateTime<Utc>,
    ) -> AppResult<Vec<ReadReceipt>> {
        self.check_writable()?;

        let Some(mut list) = self.tables.messages.get_mut(&conversation_id) else {
            return Ok(Vec::new());
        };

        let mut receipts = Vec::new();
        for message in list.iter_mut().filter(|m| m.is_unread_for(reader)) {
            message.is_read = true;
            message.read_at = Some(read_at);
            receipts.push(ReadReceipt {
                message_id: message.id,
                conversation_id,
                sender_id: message.sender_id,
                read_at,
            });
        }
        Ok(receipts)
    }

    async fn unread_count_for(&self, user_id: UserId) -> AppResult<u64> {
        let conversation_ids: Vec<ConversationId> = self
            .tables
            .conversations
            .iter()
            .filter(|c| c.is_active && c.involves(user_id))
            .map(|c| c.id)
            .collect();

        let count: u64 = conversation_ids
            .iter()
            .filter_map(|id| self.tables.messages.get(id))
            .map(|list| {
                list.iter()
                    .filter(|m| !m.is_deleted && m.is_unread_for(user_id))
                    .count() as u64
            })
            .sum();
        Ok(count)
    }

    async fn page(
        &self,
        conversation_id: ConversationId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Message>> {
        let mut visible: Vec<Message> = self
            .tables
            .messages
            .get(&conversation_id)
            .map(|list| list.iter().filter(|m| !m.is_deleted).cloned().collect())
            .unwrap_or_default();
        visible.sort_by_key(Message::order_key);
        Ok(PageResponse::from_ordered(visible, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::error::ErrorKind;
    use bazaar_entity::message::MessageKind;

    fn pair() -> (UserId, UserId) {
        (UserId::new(), UserId::new())
    }

    async fn open(store: &MemoryStore, a: UserId, b: UserId) -> Conversation {
        store
            .insert_or_get(Conversation::new(ConversationKey::new(a, b, None), None))
            .await
            .expect("insert conversation")
    }

    #[tokio::test]
    async fn test_insert_or_get_returns_existing_row() {
        let store = MemoryStore::new();
        let (a, b) = pair();
        let first = open(&store, a, b).await;
        let second = open(&store, b, a).await;
        assert_eq!(first.id, second.id);
        assert_eq!(store.conversation_count(), 1);
    }

    #[tokio::test]
    async fn test_without_unique_index_allows_duplicates() {
        let store = MemoryStore::without_unique_index();
        let (a, b) = pair();
        let first = open(&store, a, b).await;
        let second = open(&store, a, b).await;
        assert_ne!(first.id, second.id);
        assert_eq!(store.active_count(&ConversationKey::new(a, b, None)), 2);
    }

    #[tokio::test]
    async fn test_find_active_matches_key_and_skips_inactive() {
        let store = MemoryStore::new();
        let (a, b) = pair();
        let conversation = open(&store, a, b).await;

        let found = store
            .find_active(&ConversationKey::new(b, a, None))
            .await
            .expect("lookup");
        assert_eq!(found.map(|c| c.id), Some(conversation.id));

        let other_product = ConversationKey::new(a, b, Some(bazaar_core::types::id::ProductId::new()));
        assert!(store.find_active(&other_product).await.expect("lookup").is_none());
        assert_eq!(store.active_count(&other_product), 0);

        assert!(store.deactivate(conversation.id).await.expect("deactivate"));
        assert!(
            store
                .find_active(&ConversationKey::new(a, b, None))
                .await
                .expect("lookup")
                .is_none()
        );
        assert_eq!(store.active_count(&ConversationKey::new(a, b, None)), 0);
    }

    #[tokio::test]
    async fn test_deactivate_frees_key() {
        let store = MemoryStore::new();
        let (a, b) = pair();
        let first = open(&store, a, b).await;
        assert!(store.deactivate(first.id).await.expect("deactivate"));
        assert!(!store.deactivate(first.id).await.expect("second deactivate"));

        let fresh = open(&store, a, b).await;
        assert_ne!(fresh.id, first.id);
    }

    #[tokio::test]
    async fn test_append_advances_recency() {
        let store = MemoryStore::new();
        let (a, b) = pair();
        let conversation = open(&store, a, b).await;

        let mut message = Message::new(conversation.id, a, "hello", MessageKind::Text, None);
        message.created_at = conversation.created_at + chrono::Duration::seconds(5);
        let stored = store.append(message).await.expect("append");

        let reloaded = ConversationRepository::find_by_id(&store, conversation.id)
            .await
            .expect("find")
            .expect("present");
        assert_eq!(reloaded.last_message_at, stored.created_at);
    }

    #[tokio::test]
    async fn test_append_to_unknown_conversation_fails() {
        let store = MemoryStore::new();
        let message = Message::new(
            ConversationId::new(),
            UserId::new(),
            "hello",
            MessageKind::Text,
            None,
        );
        let err = store.append(message).await.expect_err("must fail");
        assert_eq!(err.kind, ErrorKind::Persistence);
        assert_eq!(store.message_count(), 0);
    }

    #[tokio::test]
    async fn test_mark_read_returns_only_flipped() {
        let store = MemoryStore::new();
        let (a, b) = pair();
        let conversation = open(&store, a, b).await;
        for body in ["one", "two"] {
            store
                .append(Message::new(conversation.id, a, body, MessageKind::Text, None))
                .await
                .expect("append");
        }
        store
            .append(Message::new(conversation.id, b, "reply", MessageKind::Text, None))
            .await
            .expect("append");

        let first = store
            .mark_read(conversation.id, b, Utc::now())
            .await
            .expect("mark read");
        assert_eq!(first.len(), 2);
        assert!(first.iter().all(|r| r.sender_id == a));

        let second = store
            .mark_read(conversation.id, b, Utc::now())
            .await
            .expect("mark read again");
        assert!(second.is_empty());
        assert_eq!(store.unread_count_for(a).await.expect("count"), 1);
        assert_eq!(store.unread_count_for(b).await.expect("count"), 0);
    }

    #[tokio::test]
    async fn test_failing_writes_surface_persistence_errors() {
        let store = MemoryStore::new();
        let (a, b) = pair();
        let conversation = open(&store, a, b).await;
        store.set_fail_writes(true);

        let err = store
            .append(Message::new(conversation.id, a, "x", MessageKind::Text, None))
            .await
            .expect_err("writes disabled");
        assert_eq!(err.kind, ErrorKind::Persistence);
    }
}
