//! Request DTOs.

use serde::{Deserialize, Serialize};

use bazaar_core::types::id::{OrderId, ProductId, UserId};

/// Start (or resume) a conversation with another user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    /// The other participant.
    pub other_user_id: UserId,
    /// Listing the conversation is about.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    /// Order the conversation is about.
    #[serde(default)]
    pub order_id: Option<OrderId>,
}
