//! Conversation entity model.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use bazaar_core::types::id::{ConversationId, OrderId, ProductId, UserId};

/// A durable pairing of two users, optionally scoped to a product.
///
/// The pair is stored canonically: `participant_a` always holds the
/// smaller id, so `(a, b)` and `(b, a)` map to the same row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    /// Unique conversation identifier.
    pub id: ConversationId,
    /// The participant with the smaller id.
    pub participant_a: UserId,
    /// The participant with the larger id.
    pub participant_b: UserId,
    /// Product the conversation is about, if any.
    pub product_id: Option<ProductId>,
    /// Order the conversation is about, if any.
    pub order_id: Option<OrderId>,
    /// When the conversation was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent message (equals `created_at` until then).
    pub last_message_at: DateTime<Utc>,
    /// Inactive conversations are hidden from listings and lookups.
    pub is_active: bool,
}

impl Conversation {
    /// Create a new active conversation for the given key.
    pub fn new(key: ConversationKey, order_id: Option<OrderId>) -> Self {
        let now = Utc::now().trunc_subsecs(6);
        Self {
            id: ConversationId::new(),
            participant_a: key.participant_a,
            participant_b: key.participant_b,
            product_id: key.product_id,
            order_id,
            created_at: now,
            last_message_at: now,
            is_active: true,
        }
    }

    /// The uniqueness key of this conversation.
    pub fn key(&self) -> ConversationKey {
        ConversationKey {
            participant_a: self.participant_a,
            participant_b: self.participant_b,
            product_id: self.product_id,
        }
    }

    /// Whether the user is one of the two participants.
    pub fn involves(&self, user_id: UserId) -> bool {
        self.participant_a == user_id || self.participant_b == user_id
    }

    /// The participant that is not `user_id`, or `None` if `user_id` is not a participant.
    pub fn other_participant(&self, user_id: UserId) -> Option<UserId> {
        if self.participant_a == user_id {
            Some(self.participant_b)
        } else if self.participant_b == user_id {
            Some(self.participant_a)
        } else {
            None
        }
    }
}

/// Canonical (unordered pair, product context) key of an active conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    /// The smaller participant id.
    pub participant_a: UserId,
    /// The larger participant id.
    pub participant_b: UserId,
    /// Exact product context; `None` only matches `None`.
    pub product_id: Option<ProductId>,
}

impl ConversationKey {
    /// Build a key from two users in any order.
    pub fn new(first: UserId, second: UserId, product_id: Option<ProductId>) -> Self {
        let (participant_a, participant_b) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        Self {
            participant_a,
            participant_b,
            product_id,
        }
    }

    /// Whether both sides are the same user.
    pub fn is_self_pair(&self) -> bool {
        self.participant_a == self.participant_b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_symmetric() {
        let a = UserId::new();
        let b = UserId::new();
        let product = Some(ProductId::new());
        assert_eq!(
            ConversationKey::new(a, b, product),
            ConversationKey::new(b, a, product)
        );
    }

    #[test]
    fn test_key_distinguishes_product_context() {
        let a = UserId::new();
        let b = UserId::new();
        assert_ne!(
            ConversationKey::new(a, b, None),
            ConversationKey::new(a, b, Some(ProductId::new()))
        );
    }

    #[test]
    fn test_new_conversation_stamps_recency() {
        let conversation = Conversation::new(ConversationKey::new(UserId::new(), UserId::new(), None), None);
        assert_eq!(conversation.created_at, conversation.last_message_at);
        assert!(conversation.is_active);
        assert!(conversation.participant_a <= conversation.participant_b);
    }

    #[test]
    fn test_other_participant() {
        let a = UserId::new();
        let b = UserId::new();
        let conversation = Conversation::new(ConversationKey::new(a, b, None), None);
        assert_eq!(conversation.other_participant(a), Some(b));
        assert_eq!(conversation.other_participant(b), Some(a));
        assert_eq!(conversation.other_participant(UserId::new()), None);
        assert!(!conversation.involves(UserId::new()));
    }
}
