//! Inbound and outbound WebSocket frame definitions.
//!
//! Every frame is a JSON object tagged by `"type"`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::traits::catalog::ProductSnippet;
use bazaar_core::types::id::{ConversationId, MessageId, UserId};
use bazaar_entity::message::{Message, MessageKind};
use bazaar_entity::presence::PresenceStatus;

use crate::dispatch::status::DeliveryStatus;

/// Frames sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Send a chat message.
    ChatSend {
        /// Target conversation.
        conversation_id: ConversationId,
        /// Body text.
        #[serde(default)]
        content: String,
        /// Message kind, `text` when omitted.
        #[serde(default)]
        kind: MessageKind,
        /// Attachment location for image/file messages.
        #[serde(default)]
        attachment_url: Option<String>,
        /// Client correlation id echoed in status frames.
        #[serde(default)]
        client_ref: Option<String>,
    },
    /// Start or stop a typing indicator.
    ChatTyping {
        /// Conversation being typed in.
        conversation_id: ConversationId,
        /// Whether the user is typing.
        is_typing: bool,
    },
    /// Mark everything up to a received message as read.
    ChatRead {
        /// A message in the conversation being read.
        message_id: MessageId,
    },
    /// Change own presence status.
    PresenceUpdate {
        /// New status.
        status: PresenceStatus,
    },
    /// Subscribe to a channel.
    Subscribe {
        /// Channel name.
        channel: String,
    },
    /// Unsubscribe from a channel.
    Unsubscribe {
        /// Channel name.
        channel: String,
    },
    /// Pong response to server ping.
    Pong {
        /// Echoed timestamp.
        #[serde(default)]
        timestamp: Option<i64>,
    },
}

/// Frames sent by the server to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// A new message for the recipient.
    ChatMessage {
        /// The message.
        message: ChatMessagePayload,
    },
    /// Delivery progress of a message the client sent.
    MessageStatus {
        /// Client correlation id from `chat_send`.
        client_ref: Option<String>,
        /// Stored message id; absent when nothing was stored.
        message_id: Option<MessageId>,
        /// Conversation of the message.
        conversation_id: ConversationId,
        /// Current status.
        status: DeliveryStatus,
        /// Why the send failed.
        error: Option<ErrorPayload>,
    },
    /// Typing indicator from another participant.
    Typing {
        /// Conversation being typed in.
        conversation_id: ConversationId,
        /// Who is typing.
        user_id: UserId,
        /// Their display name.
        display_name: String,
        /// Whether they are typing.
        is_typing: bool,
        /// When the signal was received.
        timestamp: DateTime<Utc>,
    },
    /// The other participant read some of your messages.
    ReadReceipt {
        /// Conversation of the messages.
        conversation_id: ConversationId,
        /// Who read them.
        reader_id: UserId,
        /// Messages that became read.
        message_ids: Vec<MessageId>,
        /// Always `read`.
        status: DeliveryStatus,
        /// When they were read.
        read_at: DateTime<Utc>,
    },
    /// Presence update for a user.
    PresenceChanged {
        /// User ID.
        user_id: UserId,
        /// New status.
        status: PresenceStatus,
        /// When the status was recorded.
        last_seen: DateTime<Utc>,
    },
    /// Current unread message count.
    UnreadCount {
        /// Unread messages addressed to the user.
        count: u64,
    },
    /// Subscription confirmed.
    Subscribed {
        /// Channel name.
        channel: String,
    },
    /// Unsubscription confirmed.
    Unsubscribed {
        /// Channel name.
        channel: String,
    },
    /// Ping (server keepalive).
    Ping {
        /// Server timestamp in milliseconds.
        timestamp: i64,
    },
    /// Error message.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}

impl OutboundMessage {
    /// The wire `type` tag, used for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChatMessage { .. } => "chat_message",
            Self::MessageStatus { .. } => "message_status",
            Self::Typing { .. } => "typing",
            Self::ReadReceipt { .. } => "read_receipt",
            Self::PresenceChanged { .. } => "presence_changed",
            Self::UnreadCount { .. } => "unread_count",
            Self::Subscribed { .. } => "subscribed",
            Self::Unsubscribed { .. } => "unsubscribed",
            Self::Ping { .. } => "ping",
            Self::Error { .. } => "error",
        }
    }
}

/// A chat message as delivered to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessagePayload {
    /// Message id.
    pub id: MessageId,
    /// Conversation id.
    pub conversation_id: ConversationId,
    /// Author.
    pub sender_id: UserId,
    /// Author display name.
    pub sender_name: String,
    /// Body text.
    pub content: String,
    /// Message kind.
    pub kind: MessageKind,
    /// Attachment location.
    pub attachment_url: Option<String>,
    /// When the message was accepted.
    pub created_at: DateTime<Utc>,
    /// Product the conversation is about, when known.
    pub product: Option<ProductSnippet>,
}

impl ChatMessagePayload {
    /// Build the payload for a stored message.
    pub fn from_message(
        message: &Message,
        sender_name: impl Into<String>,
        product: Option<ProductSnippet>,
    ) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            sender_name: sender_name.into(),
            content: message.content.clone(),
            kind: message.kind,
            attachment_url: message.attachment_url.clone(),
            created_at: message.created_at,
            product,
        }
    }
}

/// Error detail attached to a failed status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Error code.
    pub code: String,
    /// Error description.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_send_defaults() {
        let conversation = ConversationId::new();
        let raw = format!(
            r#"{{"type":"chat_send","conversation_id":"{conversation}","content":"hello"}}"#
        );
        let parsed: InboundMessage = serde_json::from_str(&raw).expect("parse");
        match parsed {
            InboundMessage::ChatSend {
                conversation_id,
                content,
                kind,
                attachment_url,
                client_ref,
            } => {
                assert_eq!(conversation_id, conversation);
                assert_eq!(content, "hello");
                assert_eq!(kind, MessageKind::Text);
                assert!(attachment_url.is_none());
                assert!(client_ref.is_none());
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn test_presence_update_parses_status() {
        let parsed: InboundMessage =
            serde_json::from_str(r#"{"type":"presence_update","status":"away"}"#).expect("parse");
        assert!(matches!(
            parsed,
            InboundMessage::PresenceUpdate {
                status: PresenceStatus::Away
            }
        ));
    }

    #[test]
    fn test_outbound_tag_matches_kind() {
        let frame = OutboundMessage::UnreadCount { count: 3 };
        let json = serde_json::to_value(&frame).expect("serialize");
        assert_eq!(json["type"], frame.kind());
        assert_eq!(json["count"], 3);
    }
}
