//! Fallback notifications for recipients that are not online.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use bazaar_core::config::NotificationsConfig;
use bazaar_core::traits::notify::{NewNotification, NotificationSink};
use bazaar_core::types::id::{NotificationId, UserId};
use bazaar_entity::message::Message;

use crate::metrics::EngineMetrics;

use super::formatter::NotificationFormatter;

/// Notification category for chat events.
pub const CHAT_CATEGORY: &str = "chat";
/// Event type for a new chat message.
pub const CHAT_MESSAGE_EVENT: &str = "chat.message";
/// Resource type pointing back at the conversation.
pub const CONVERSATION_RESOURCE: &str = "conversation";

/// Creates durable notifications when live delivery is not possible.
///
/// Never fails: sink errors and timeouts are logged and reported as `None`.
#[derive(Debug, Clone)]
pub struct NotificationFallback {
    sink: Arc<dyn NotificationSink>,
    config: NotificationsConfig,
    metrics: Arc<EngineMetrics>,
}

impl NotificationFallback {
    /// Create a new fallback over a notification sink.
    pub fn new(
        sink: Arc<dyn NotificationSink>,
        config: NotificationsConfig,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            sink,
            config,
            metrics,
        }
    }

    /// Build the notification for a message without sending it.
    pub fn build(&self, recipient: UserId, sender_name: &str, message: &Message) -> NewNotification {
        NewNotification {
            user_id: recipient,
            category: CHAT_CATEGORY.to_string(),
            event_type: CHAT_MESSAGE_EVENT.to_string(),
            title: NotificationFormatter::title(sender_name),
            message: NotificationFormatter::preview(
                &message.content,
                message.kind,
                self.config.preview_length,
            ),
            payload: Some(NotificationFormatter::payload(message, sender_name)),
            actor_id: Some(message.sender_id),
            resource_type: Some(CONVERSATION_RESOURCE.to_string()),
            resource_id: Some(message.conversation_id.into_uuid()),
        }
    }

    /// Persist a notification telling `recipient` about `message`.
    pub async fn notify_offline(
        &self,
        recipient: UserId,
        sender_name: &str,
        message: &Message,
    ) -> Option<NotificationId> {
        let notification = self.build(recipient, sender_name, message);
        let timeout = Duration::from_millis(self.config.fallback_timeout_ms.max(1));

        match tokio::time::timeout(timeout, self.sink.create(notification)).await {
            Ok(Ok(id)) => {
                self.metrics.fallback_created();
                debug!(
                    user_id = %recipient,
                    message_id = %message.id,
                    notification_id = %id,
                    "Fallback notification created"
                );
                Some(id)
            }
            Ok(Err(e)) => {
                self.metrics.fallback_failed();
                warn!(
                    user_id = %recipient,
                    message_id = %message.id,
                    error = %e,
                    "Failed to create fallback notification"
                );
                None
            }
            Err(_) => {
                self.metrics.fallback_failed();
                warn!(
                    user_id = %recipient,
                    message_id = %message.id,
                    timeout_ms = self.config.fallback_timeout_ms,
                    "Fallback notification timed out"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::types::id::ConversationId;
    use bazaar_database::memory::MemoryNotificationSink;
    use bazaar_entity::message::MessageKind;

    fn message(content: &str) -> Message {
        Message::new(
            ConversationId::new(),
            UserId::new(),
            content.to_string(),
            MessageKind::Text,
            None,
        )
    }

    fn fallback(sink: Arc<MemoryNotificationSink>, timeout_ms: u64) -> NotificationFallback {
        let config = NotificationsConfig {
            fallback_timeout_ms: timeout_ms,
            ..NotificationsConfig::default()
        };
        NotificationFallback::new(sink, config, Arc::new(EngineMetrics::new()))
    }

    #[tokio::test]
    async fn test_creates_chat_notification() {
        let sink = Arc::new(MemoryNotificationSink::new());
        let fallback = fallback(sink.clone(), 2000);
        let recipient = UserId::new();
        let msg = message("hello");

        let id = fallback.notify_offline(recipient, "alice", &msg).await;
        assert!(id.is_some());

        let stored = sink.for_user(recipient).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].category, "chat");
        assert_eq!(stored[0].event_type, "chat.message");
        assert_eq!(stored[0].message, "hello");
        assert_eq!(stored[0].actor_id, Some(msg.sender_id));
        assert_eq!(stored[0].resource_id, Some(msg.conversation_id.into_uuid()));
    }

    #[tokio::test]
    async fn test_sink_failure_is_swallowed() {
        let sink = Arc::new(MemoryNotificationSink::new());
        sink.set_failing(true);
        let fallback = fallback(sink.clone(), 2000);

        assert!(fallback.notify_offline(UserId::new(), "alice", &message("hi")).await.is_none());
        assert_eq!(fallback.metrics.snapshot().fallbacks_failed, 1);
    }

    #[tokio::test]
    async fn test_slow_sink_times_out() {
        let sink = Arc::new(MemoryNotificationSink::new().with_delay(Duration::from_millis(500)));
        let fallback = fallback(sink.clone(), 20);

        assert!(fallback.notify_offline(UserId::new(), "alice", &message("hi")).await.is_none());
        assert!(sink.is_empty().await);
    }
}
