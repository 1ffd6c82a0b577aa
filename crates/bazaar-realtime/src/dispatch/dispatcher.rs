//! Chat dispatcher: routes inbound frames and orchestrates message delivery.
//!
//! A send goes through four steps: participant check, persistence, live push
//! (or fallback notification), and acknowledgement to the sender. Only the
//! first two can fail the send. Everything after persistence is best-effort
//! and never changes what the sender is told about storage.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use bazaar_core::error::AppError;
use bazaar_core::result::AppResult;
use bazaar_core::traits::catalog::{ProductCatalog, ProductSnippet};
use bazaar_core::traits::identity::Identity;
use bazaar_core::types::id::{ConversationId, MessageId, NotificationId, UserId};
use bazaar_entity::conversation::Conversation;
use bazaar_entity::message::ReadReceipt;
use bazaar_entity::presence::{PresenceRecord, PresenceStatus};
use bazaar_service::{ConversationService, MessageService, OutgoingMessage};

use crate::channel::types::ChannelType;
use crate::connection::handle::{ConnectionHandle, ConnectionId};
use crate::connection::manager::ConnectionManager;
use crate::message::builder::{
    build_error, build_failed, build_presence, build_read_receipt, build_status, build_typing,
};
use crate::message::types::{ChatMessagePayload, InboundMessage, OutboundMessage};
use crate::message::validator::{validate_channel_name, validate_inbound};
use crate::metrics::EngineMetrics;
use crate::notification::fallback::NotificationFallback;
use crate::presence::tracker::PresenceTracker;

use super::status::DeliveryStatus;

/// What happened to a single `chat_send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    /// Last status reported to the sender.
    pub status: DeliveryStatus,
    /// Stored message, when persistence succeeded.
    pub message_id: Option<MessageId>,
    /// Recipient connections that accepted the push.
    pub pushed_to: usize,
    /// Fallback notification, when one was created.
    pub notification_id: Option<NotificationId>,
}

impl SendReport {
    fn failed() -> Self {
        Self {
            status: DeliveryStatus::Failed,
            message_id: None,
            pushed_to: 0,
            notification_id: None,
        }
    }
}

/// Routes frames from connected clients to the chat services.
#[derive(Debug, Clone)]
pub struct ChatDispatcher {
    conversations: ConversationService,
    messages: MessageService,
    catalog: Arc<dyn ProductCatalog>,
    presence: PresenceTracker,
    connections: Arc<ConnectionManager>,
    fallback: NotificationFallback,
    metrics: Arc<EngineMetrics>,
}

impl ChatDispatcher {
    /// Create a dispatcher over the chat services and realtime subsystems.
    pub fn new(
        conversations: ConversationService,
        messages: MessageService,
        catalog: Arc<dyn ProductCatalog>,
        presence: PresenceTracker,
        connections: Arc<ConnectionManager>,
        fallback: NotificationFallback,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            conversations,
            messages,
            catalog,
            presence,
            connections,
            fallback,
            metrics,
        }
    }

    /// Register a connection, mark the user online, and announce it.
    pub async fn on_connect(
        &self,
        identity: &Identity,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (handle, rx) = self.connections.register(identity);

        let record = self
            .presence
            .set(identity.user_id, PresenceStatus::Online)
            .await;
        self.broadcast_presence(&record);

        match self.messages.unread_count_for(identity.user_id).await {
            Ok(count) => {
                self.connections
                    .send_to_handle(&handle, &OutboundMessage::UnreadCount { count });
            }
            Err(e) => warn!(user_id = %identity.user_id, error = %e, "Initial unread count failed"),
        }

        (handle, rx)
    }

    /// Unregister a connection. The user goes offline when it was their last.
    pub async fn on_disconnect(&self, conn_id: &ConnectionId) {
        let Some(departure) = self.connections.unregister(conn_id) else {
            return;
        };
        if departure.was_last {
            let record = self
                .presence
                .set(departure.handle.user_id, PresenceStatus::Offline)
                .await;
            self.broadcast_presence(&record);
        }
    }

    /// Handle a raw text frame from a client.
    ///
    /// Never fails: problems are reported to the client as `error` or
    /// `message_status` frames.
    pub async fn handle_inbound(&self, handle: &ConnectionHandle, raw: &str) {
        self.metrics.frame_received();

        if let Err(e) = validate_inbound(raw, self.connections.config().max_frame_bytes) {
            self.reply_error(handle, &e);
            return;
        }

        let inbound: InboundMessage = match serde_json::from_str(raw) {
            Ok(inbound) => inbound,
            Err(e) => {
                debug!(conn_id = %handle.id, error = %e, "Malformed frame");
                self.reply_error(handle, &AppError::validation(format!("Malformed frame: {e}")));
                return;
            }
        };

        match inbound {
            InboundMessage::ChatSend {
                conversation_id,
                content,
                kind,
                attachment_url,
                client_ref,
            } => {
                let outgoing = OutgoingMessage {
                    content,
                    kind,
                    attachment_url,
                };
                self.send_message(handle, conversation_id, outgoing, client_ref)
                    .await;
            }
            InboundMessage::ChatTyping {
                conversation_id,
                is_typing,
            } => {
                if let Err(e) = self.typing(handle, conversation_id, is_typing).await {
                    self.reply_error(handle, &e);
                }
            }
            InboundMessage::ChatRead { message_id } => {
                if let Err(e) = self.read(handle.user_id, message_id).await {
                    self.reply_error(handle, &e);
                }
            }
            InboundMessage::PresenceUpdate { status } => {
                self.update_presence(handle.user_id, status).await;
            }
            InboundMessage::Subscribe { channel } => {
                match self.subscribe(handle, &channel).await {
                    Ok(_) => {
                        self.connections
                            .send_to_handle(handle, &OutboundMessage::Subscribed { channel });
                    }
                    Err(e) => self.reply_error(handle, &e),
                }
            }
            InboundMessage::Unsubscribe { channel } => match ChannelType::parse(&channel) {
                Some(parsed) => {
                    self.connections.unsubscribe(handle.id, &parsed);
                    self.connections
                        .send_to_handle(handle, &OutboundMessage::Unsubscribed { channel });
                }
                None => self.reply_error(
                    handle,
                    &AppError::validation(format!("Unknown channel: {channel}")),
                ),
            },
            InboundMessage::Pong { .. } => {
                self.pong(handle).await;
            }
        }
    }

    /// Deliver a chat message from the connection's user.
    ///
    /// The sending connection receives `message_status` frames: `failed` when
    /// the message was rejected or not stored, otherwise `sent` followed by
    /// `delivered` if a live recipient connection accepted the push. The
    /// sender's other connections get the `sent`/`delivered` frames too,
    /// without the `client_ref`.
    pub async fn send_message(
        &self,
        sender: &ConnectionHandle,
        conversation_id: ConversationId,
        outgoing: OutgoingMessage,
        client_ref: Option<String>,
    ) -> SendReport {
        let conversation = match self
            .conversations
            .ensure_participant(conversation_id, sender.user_id)
            .await
        {
            Ok(conversation) => conversation,
            Err(e) => {
                self.connections
                    .send_to_handle(sender, &build_failed(client_ref, conversation_id, &e));
                return SendReport::failed();
            }
        };

        let message = match self
            .messages
            .append_to(&conversation, sender.user_id, outgoing)
            .await
        {
            Ok(message) => message,
            Err(e) => {
                self.metrics.persistence_failed();
                self.connections
                    .send_to_handle(sender, &build_failed(client_ref, conversation_id, &e));
                return SendReport::failed();
            }
        };
        self.metrics.message_persisted();

        self.confirm(sender, client_ref.clone(), message.id, conversation_id, DeliveryStatus::Sent);

        let mut report = SendReport {
            status: DeliveryStatus::Sent,
            message_id: Some(message.id),
            pushed_to: 0,
            notification_id: None,
        };

        let Some(recipient) = conversation.other_participant(sender.user_id) else {
            return report;
        };

        if self.presence.is_online(recipient).await {
            let product = self.product_snippet(&conversation).await;
            let frame = OutboundMessage::ChatMessage {
                message: ChatMessagePayload::from_message(&message, &sender.display_name, product),
            };
            report.pushed_to = self
                .connections
                .broadcast(&ChannelType::User(recipient), &frame);
        }

        if report.pushed_to > 0 {
            self.metrics.push_delivered();
            report.status = DeliveryStatus::Delivered;
            self.confirm(sender, client_ref, message.id, conversation_id, DeliveryStatus::Delivered);
        } else {
            report.notification_id = self
                .fallback
                .notify_offline(recipient, &sender.display_name, &message)
                .await;
        }

        debug!(
            message_id = %message.id,
            conversation_id = %conversation_id,
            recipient = %recipient,
            pushed_to = report.pushed_to,
            fallback = report.notification_id.is_some(),
            "Message dispatched"
        );
        report
    }

    /// Relay a typing signal to the conversation's typing topic.
    ///
    /// Returns how many connections received it. The sender's own connection
    /// is skipped.
    pub async fn typing(
        &self,
        sender: &ConnectionHandle,
        conversation_id: ConversationId,
        is_typing: bool,
    ) -> AppResult<usize> {
        if !self
            .conversations
            .is_participant(conversation_id, sender.user_id)
            .await?
        {
            return Err(AppError::access_denied(
                "You are not a participant of this conversation",
            ));
        }

        let frame = build_typing(
            conversation_id,
            sender.user_id,
            &sender.display_name,
            is_typing,
        );
        Ok(self
            .connections
            .broadcast_except(&ChannelType::Typing(conversation_id), &frame, sender.id))
    }

    /// Mark the conversation containing `message_id` read for `reader`.
    pub async fn read(&self, reader: UserId, message_id: MessageId) -> AppResult<Vec<ReadReceipt>> {
        let message = self.messages.find(message_id).await?;
        self.mark_conversation_read(reader, message.conversation_id)
            .await
    }

    /// Mark every message the reader received in a conversation as read.
    ///
    /// Senders of flipped messages get one `read_receipt` frame each; the
    /// reader gets a fresh `unread_count`. Nothing is pushed when nothing
    /// flipped.
    pub async fn mark_conversation_read(
        &self,
        reader: UserId,
        conversation_id: ConversationId,
    ) -> AppResult<Vec<ReadReceipt>> {
        let receipts = self.messages.mark_read(conversation_id, reader).await?;
        if receipts.is_empty() {
            return Ok(receipts);
        }

        let mut by_sender: BTreeMap<UserId, Vec<ReadReceipt>> = BTreeMap::new();
        for receipt in &receipts {
            by_sender
                .entry(receipt.sender_id)
                .or_default()
                .push(receipt.clone());
        }
        for (sender, flipped) in by_sender {
            let frame = build_read_receipt(conversation_id, reader, &flipped);
            self.connections.send_to_user(&sender, &frame);
        }

        self.push_unread_count(reader).await;
        Ok(receipts)
    }

    /// Record a status change and announce it on the global presence channel.
    pub async fn update_presence(&self, user_id: UserId, status: PresenceStatus) -> PresenceRecord {
        let record = self.presence.set(user_id, status).await;
        self.broadcast_presence(&record);
        record
    }

    /// Subscribe a connection to a channel the user is allowed to see.
    ///
    /// Private channels are limited to their owner and typing topics to
    /// conversation participants. Returns `false` if already subscribed.
    pub async fn subscribe(&self, handle: &ConnectionHandle, channel: &str) -> AppResult<bool> {
        validate_channel_name(channel)?;
        let parsed = ChannelType::parse(channel)
            .ok_or_else(|| AppError::validation(format!("Unknown channel: {channel}")))?;

        match parsed {
            ChannelType::User(owner) if owner != handle.user_id => {
                return Err(AppError::access_denied(
                    "Cannot subscribe to another user's channel",
                ));
            }
            ChannelType::Typing(conversation_id) => {
                if !self
                    .conversations
                    .is_participant(conversation_id, handle.user_id)
                    .await?
                {
                    return Err(AppError::access_denied(
                        "You are not a participant of this conversation",
                    ));
                }
            }
            _ => {}
        }

        let added = self.connections.subscribe(handle.id, parsed)?;
        if added {
            debug!(conn_id = %handle.id, channel = %parsed, "Subscribed");
        }
        Ok(added)
    }

    /// Heartbeat response: refresh the connection and the user's presence.
    ///
    /// A heartbeat only revives a user whose record had expired; that
    /// transition is announced like any other.
    pub async fn pong(&self, handle: &ConnectionHandle) {
        handle.record_pong().await;
        let (record, changed) = self.presence.touch(handle.user_id).await;
        if changed {
            self.broadcast_presence(&record);
        }
    }

    /// Push the user's current unread count to all of their connections.
    pub async fn push_unread_count(&self, user_id: UserId) {
        match self.messages.unread_count_for(user_id).await {
            Ok(count) => {
                self.connections
                    .send_to_user(&user_id, &OutboundMessage::UnreadCount { count });
            }
            Err(e) => warn!(user_id = %user_id, error = %e, "Unread count refresh failed"),
        }
    }

    /// Conversation service used by this dispatcher.
    pub fn conversations(&self) -> &ConversationService {
        &self.conversations
    }

    /// Message service used by this dispatcher.
    pub fn messages(&self) -> &MessageService {
        &self.messages
    }

    /// Presence tracker used by this dispatcher.
    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    async fn product_snippet(&self, conversation: &Conversation) -> Option<ProductSnippet> {
        let product_id = conversation.product_id?;
        match self.catalog.snippet(product_id).await {
            Ok(snippet) => snippet,
            Err(e) => {
                warn!(
                    conversation_id = %conversation.id,
                    product_id = %product_id,
                    error = %e,
                    "Product snippet lookup failed, sending without it"
                );
                None
            }
        }
    }

    /// Report a stored message's status on the sender's private channel.
    fn confirm(
        &self,
        sender: &ConnectionHandle,
        client_ref: Option<String>,
        message_id: MessageId,
        conversation_id: ConversationId,
        status: DeliveryStatus,
    ) {
        self.connections.send_to_handle(
            sender,
            &build_status(client_ref, message_id, conversation_id, status),
        );
        self.connections.broadcast_except(
            &ChannelType::User(sender.user_id),
            &build_status(None, message_id, conversation_id, status),
            sender.id,
        );
    }

    fn broadcast_presence(&self, record: &PresenceRecord) {
        let reached = self
            .connections
            .broadcast(&ChannelType::PresenceGlobal, &build_presence(record));
        info!(
            user_id = %record.user_id,
            status = %record.status,
            reached,
            "Presence changed"
        );
    }

    fn reply_error(&self, handle: &ConnectionHandle, err: &AppError) {
        debug!(conn_id = %handle.id, code = %err.kind, message = %err.message, "Replying with error");
        self.connections.send_to_handle(handle, &build_error(err));
    }
}
