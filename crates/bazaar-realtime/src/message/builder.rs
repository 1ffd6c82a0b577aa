//! Builder helpers for constructing outbound frames.

use chrono::{DateTime, Utc};

use bazaar_core::error::AppError;
use bazaar_core::types::id::{ConversationId, MessageId, UserId};
use bazaar_entity::message::ReadReceipt;
use bazaar_entity::presence::PresenceRecord;

use crate::dispatch::status::DeliveryStatus;

use super::types::{ErrorPayload, OutboundMessage};

/// Build an error frame from an application error.
pub fn build_error(err: &AppError) -> OutboundMessage {
    OutboundMessage::Error {
        code: err.code(),
        message: err.message.clone(),
    }
}

/// Build a delivery status frame for a stored message.
pub fn build_status(
    client_ref: Option<String>,
    message_id: MessageId,
    conversation_id: ConversationId,
    status: DeliveryStatus,
) -> OutboundMessage {
    OutboundMessage::MessageStatus {
        client_ref,
        message_id: Some(message_id),
        conversation_id,
        status,
        error: None,
    }
}

/// Build a `failed` status frame.
pub fn build_failed(
    client_ref: Option<String>,
    conversation_id: ConversationId,
    err: &AppError,
) -> OutboundMessage {
    OutboundMessage::MessageStatus {
        client_ref,
        message_id: None,
        conversation_id,
        status: DeliveryStatus::Failed,
        error: Some(ErrorPayload {
            code: err.code(),
            message: err.message.clone(),
        }),
    }
}

/// Build a typing indicator.
pub fn build_typing(
    conversation_id: ConversationId,
    user_id: UserId,
    display_name: &str,
    is_typing: bool,
) -> OutboundMessage {
    OutboundMessage::Typing {
        conversation_id,
        user_id,
        display_name: display_name.to_string(),
        is_typing,
        timestamp: Utc::now(),
    }
}

/// Build a read receipt for the messages one sender got read.
///
/// `receipts` must all belong to the same conversation.
pub fn build_read_receipt(
    conversation_id: ConversationId,
    reader_id: UserId,
    receipts: &[ReadReceipt],
) -> OutboundMessage {
    let read_at: DateTime<Utc> = receipts
        .iter()
        .map(|r| r.read_at)
        .max()
        .unwrap_or_else(Utc::now);
    OutboundMessage::ReadReceipt {
        conversation_id,
        reader_id,
        message_ids: receipts.iter().map(|r| r.message_id).collect(),
        status: DeliveryStatus::Read,
        read_at,
    }
}

/// Build a presence change from a tracker record.
pub fn build_presence(record: &PresenceRecord) -> OutboundMessage {
    OutboundMessage::PresenceChanged {
        user_id: record.user_id,
        status: record.status,
        last_seen: record.last_seen,
    }
}

/// Build a keepalive ping.
pub fn build_ping() -> OutboundMessage {
    OutboundMessage::Ping {
        timestamp: Utc::now().timestamp_millis(),
    }
}
