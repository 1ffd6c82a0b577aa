//! Notification text formatting for chat messages.

use bazaar_entity::message::{Message, MessageKind};

/// Suffix appended to truncated previews.
const ELLIPSIS: char = '…';

/// Formats chat notification fields.
pub struct NotificationFormatter;

impl NotificationFormatter {
    /// Preview text for a message body.
    ///
    /// Truncates to `max_chars` characters (not bytes) and appends `…` when
    /// anything was cut. Non-text kinds use their placeholder.
    pub fn preview(content: &str, kind: MessageKind, max_chars: usize) -> String {
        if let Some(placeholder) = kind.placeholder() {
            return placeholder.to_string();
        }

        let content = content.trim();
        let mut chars = content.char_indices();
        match chars.nth(max_chars) {
            None => content.to_string(),
            Some((cut, _)) => {
                let mut preview = content[..cut].trim_end().to_string();
                preview.push(ELLIPSIS);
                preview
            }
        }
    }

    /// Notification title for a new message.
    pub fn title(sender_name: &str) -> String {
        format!("New message from {sender_name}")
    }

    /// Structured payload the client uses to open the conversation.
    pub fn payload(message: &Message, sender_name: &str) -> serde_json::Value {
        serde_json::json!({
            "conversation_id": message.conversation_id,
            "message_id": message.id,
            "sender_id": message.sender_id,
            "sender_name": sender_name,
            "kind": message.kind,
            "created_at": message.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_unchanged() {
        assert_eq!(
            NotificationFormatter::preview("hello", MessageKind::Text, 100),
            "hello"
        );
    }

    #[test]
    fn test_long_text_is_truncated_with_ellipsis() {
        let content = "a".repeat(150);
        let preview = NotificationFormatter::preview(&content, MessageKind::Text, 100);
        assert_eq!(preview.chars().count(), 101);
        assert!(preview.ends_with('…'));
    }

    #[test]
    fn test_exact_length_is_not_truncated() {
        let content = "b".repeat(100);
        assert_eq!(
            NotificationFormatter::preview(&content, MessageKind::Text, 100),
            content
        );
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let content = "é".repeat(10);
        let preview = NotificationFormatter::preview(&content, MessageKind::Text, 3);
        assert_eq!(preview, "ééé…");
    }

    #[test]
    fn test_placeholders_for_attachments() {
        assert_eq!(
            NotificationFormatter::preview("", MessageKind::Image, 100),
            "[image]"
        );
        assert_eq!(
            NotificationFormatter::preview("see attached", MessageKind::File, 100),
            "[file]"
        );
    }
}
