//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::types::id::{ConversationId, MessageId, OrderId, ProductId, UserId};
use bazaar_entity::conversation::Conversation;
use bazaar_realtime::metrics::MetricsSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// A conversation as seen by one of its participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResponse {
    /// Conversation ID.
    pub id: ConversationId,
    /// The participant who is not the caller.
    pub other_user_id: Option<UserId>,
    /// Listing context.
    pub product_id: Option<ProductId>,
    /// Order context.
    pub order_id: Option<OrderId>,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Time of the latest message.
    pub last_message_at: DateTime<Utc>,
}

impl ConversationResponse {
    /// Project a conversation for `viewer`.
    pub fn for_viewer(conversation: &Conversation, viewer: UserId) -> Self {
        Self {
            id: conversation.id,
            other_user_id: conversation.other_participant(viewer),
            product_id: conversation.product_id,
            order_id: conversation.order_id,
            created_at: conversation.created_at,
            last_message_at: conversation.last_message_at,
        }
    }
}

/// Result of marking a conversation read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReadResponse {
    /// Conversation ID.
    pub conversation_id: ConversationId,
    /// Messages that changed from unread to read.
    pub message_ids: Vec<MessageId>,
}

/// Count response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    /// Count value.
    pub count: u64,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Uptime.
    pub uptime_seconds: u64,
}

/// Detailed health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedHealthResponse {
    /// Overall status.
    pub status: String,
    /// Database status: `connected`, `unreachable`, or `memory`.
    pub database: String,
    /// WebSocket connections.
    pub ws_connections: usize,
    /// Users with at least one connection.
    pub connected_users: usize,
    /// Users whose presence is online.
    pub online_users: usize,
    /// Engine counters.
    pub metrics: MetricsSnapshot,
}
