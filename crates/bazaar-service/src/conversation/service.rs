//! Conversation resolution, listing, and the participant gate.

use std::sync::Arc;

use tracing::{debug, info};

use bazaar_core::error::AppError;
use bazaar_core::result::AppResult;
use bazaar_core::types::id::{ConversationId, OrderId, ProductId, UserId};
use bazaar_core::types::pagination::{PageRequest, PageResponse};
use bazaar_database::repositories::ConversationRepository;
use bazaar_entity::conversation::{Conversation, ConversationKey};

/// Finds, creates, and guards conversations.
#[derive(Debug, Clone)]
pub struct ConversationService {
    /// Conversation storage.
    repo: Arc<dyn ConversationRepository>,
}

impl ConversationService {
    /// Creates a new conversation service.
    pub fn new(repo: Arc<dyn ConversationRepository>) -> Self {
        Self { repo }
    }

    /// Return the active conversation between two users for a product
    /// context, creating it on first contact.
    ///
    /// The pair is unordered and the product context is matched exactly.
    /// Concurrent first contacts converge on one row through the storage
    /// uniqueness rule.
    pub async fn resolve_or_create(
        &self,
        user_a: UserId,
        user_b: UserId,
        product_id: Option<ProductId>,
        order_id: Option<OrderId>,
    ) -> AppResult<Conversation> {
        let key = ConversationKey::new(user_a, user_b, product_id);
        if key.is_self_pair() {
            return Err(AppError::validation(
                "Cannot start a conversation with yourself",
            ));
        }

        if let Some(existing) = self.repo.find_active(&key).await? {
            debug!(conversation_id = %existing.id, "Resolved existing conversation");
            return Ok(existing);
        }

        let conversation = self
            .repo
            .insert_or_get(Conversation::new(key, order_id))
            .await?;

        info!(
            conversation_id = %conversation.id,
            participant_a = %conversation.participant_a,
            participant_b = %conversation.participant_b,
            product_id = ?conversation.product_id,
            "Conversation resolved"
        );
        Ok(conversation)
    }

    /// Active conversations of a user, most recent activity first.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Conversation>> {
        self.repo.list_active_for_user(user_id, page).await
    }

    /// Whether the user participates in the active conversation.
    ///
    /// Unknown and inactive conversations yield `false`.
    pub async fn is_participant(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> AppResult<bool> {
        Ok(self
            .repo
            .find_by_id(conversation_id)
            .await?
            .is_some_and(|c| c.is_active && c.involves(user_id)))
    }

    /// Load the conversation if the user participates in it.
    ///
    /// Fails closed with `AccessDenied` for unknown, inactive, and foreign
    /// conversations alike, so callers cannot learn which ids exist.
    pub async fn ensure_participant(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> AppResult<Conversation> {
        match self.repo.find_by_id(conversation_id).await? {
            Some(conversation) if conversation.is_active && conversation.involves(user_id) => {
                Ok(conversation)
            }
            _ => {
                debug!(
                    conversation_id = %conversation_id,
                    user_id = %user_id,
                    "Participant check failed"
                );
                Err(AppError::access_denied(
                    "You are not a participant of this conversation",
                ))
            }
        }
    }

    /// Fetch a conversation on behalf of a participant.
    pub async fn get(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> AppResult<Conversation> {
        self.ensure_participant(conversation_id, user_id).await
    }

    /// Hide a conversation from both participants.
    ///
    /// A later `resolve_or_create` for the same pair and product starts a
    /// fresh conversation.
    pub async fn deactivate(&self, conversation_id: ConversationId, user_id: UserId) -> AppResult<()> {
        self.ensure_participant(conversation_id, user_id).await?;
        if self.repo.deactivate(conversation_id).await? {
            info!(conversation_id = %conversation_id, user_id = %user_id, "Conversation deactivated");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::error::ErrorKind;
    use bazaar_database::memory::MemoryStore;

    fn service(store: &MemoryStore) -> ConversationService {
        ConversationService::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent_and_symmetric() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let (a, b) = (UserId::new(), UserId::new());
        let product = Some(ProductId::new());

        let first = svc.resolve_or_create(a, b, product, None).await.expect("create");
        let again = svc.resolve_or_create(a, b, product, None).await.expect("again");
        let flipped = svc.resolve_or_create(b, a, product, None).await.expect("flipped");

        assert_eq!(first.id, again.id);
        assert_eq!(first.id, flipped.id);
        assert_eq!(store.conversation_count(), 1);
    }

    #[tokio::test]
    async fn test_product_context_is_matched_exactly() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let (a, b) = (UserId::new(), UserId::new());

        let general = svc.resolve_or_create(a, b, None, None).await.expect("general");
        let p1 = svc
            .resolve_or_create(a, b, Some(ProductId::new()), None)
            .await
            .expect("p1");
        let p2 = svc
            .resolve_or_create(a, b, Some(ProductId::new()), None)
            .await
            .expect("p2");

        assert_ne!(general.id, p1.id);
        assert_ne!(p1.id, p2.id);
        assert_eq!(store.conversation_count(), 3);
    }

    #[tokio::test]
    async fn test_self_conversation_is_rejected() {
        let svc = service(&MemoryStore::new());
        let a = UserId::new();
        let err = svc
            .resolve_or_create(a, a, None, None)
            .await
            .expect_err("self chat");
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_gate_fails_closed() {
        let svc = service(&MemoryStore::new());
        let (a, b) = (UserId::new(), UserId::new());
        let conversation = svc.resolve_or_create(a, b, None, None).await.expect("create");

        assert!(svc.is_participant(conversation.id, a).await.expect("check"));
        assert!(!svc.is_participant(conversation.id, UserId::new()).await.expect("check"));
        assert!(!svc.is_participant(ConversationId::new(), a).await.expect("check"));

        let foreign = svc
            .ensure_participant(conversation.id, UserId::new())
            .await
            .expect_err("outsider");
        let unknown = svc
            .ensure_participant(ConversationId::new(), a)
            .await
            .expect_err("unknown");
        assert_eq!(foreign.kind, ErrorKind::AccessDenied);
        assert_eq!(unknown.kind, ErrorKind::AccessDenied);
        assert_eq!(foreign.message, unknown.message);
    }

    #[tokio::test]
    async fn test_deactivated_conversation_is_hidden_and_replaced() {
        let svc = service(&MemoryStore::new());
        let (a, b) = (UserId::new(), UserId::new());
        let old = svc.resolve_or_create(a, b, None, None).await.expect("create");

        svc.deactivate(old.id, b).await.expect("deactivate");

        let listed = svc.list_for_user(a, &PageRequest::default()).await.expect("list");
        assert!(listed.items.is_empty());
        assert!(!svc.is_participant(old.id, a).await.expect("check"));

        let fresh = svc.resolve_or_create(a, b, None, None).await.expect("recreate");
        assert_ne!(fresh.id, old.id);
    }

    #[tokio::test]
    async fn test_listing_is_scoped_to_user() {
        let svc = service(&MemoryStore::new());
        let (a, b, c) = (UserId::new(), UserId::new(), UserId::new());
        svc.resolve_or_create(a, b, None, None).await.expect("ab");
        svc.resolve_or_create(a, c, None, None).await.expect("ac");
        svc.resolve_or_create(b, c, None, None).await.expect("bc");

        let page = svc.list_for_user(a, &PageRequest::default()).await.expect("list");
        assert_eq!(page.total_items, 2);
        assert!(page.items.iter().all(|conv| conv.involves(a)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_contact_converges_with_unique_index() {
        let store = MemoryStore::new();
        let svc = service(&store);
        let (a, b) = (UserId::new(), UserId::new());

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let svc = svc.clone();
                let (x, y) = if i % 2 == 0 { (a, b) } else { (b, a) };
                tokio::spawn(async move { svc.resolve_or_create(x, y, None, None).await })
            })
            .collect();

        let results = futures::future::join_all(tasks).await;
        let ids: Vec<ConversationId> = results
            .into_iter()
            .map(|r| r.expect("join").expect("resolve").id)
            .collect();

        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(store.active_count(&ConversationKey::new(a, b, None)), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_contact_without_unique_index() {
        let store = MemoryStore::without_unique_index();
        let svc = service(&store);
        let (a, b) = (UserId::new(), UserId::new());

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.resolve_or_create(a, b, None, None).await })
            })
            .collect();
        for result in futures::future::join_all(tasks).await {
            result.expect("join").expect("resolve");
        }

        // Duplicates are possible here; every row still belongs to the pair.
        let active = store.active_count(&ConversationKey::new(a, b, None));
        assert!((1..=32).contains(&active));
    }
}
