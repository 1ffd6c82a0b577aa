//! Channel type definitions and parsing.

use std::fmt;

use serde::{Deserialize, Serialize};

use bazaar_core::types::id::{ConversationId, UserId};

/// Typed channel identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum ChannelType {
    /// Private inbound channel of a user: chat messages, receipts, statuses.
    User(UserId),
    /// Typing indicators of one conversation.
    Typing(ConversationId),
    /// Presence changes of every user.
    PresenceGlobal,
}

impl ChannelType {
    /// Parses a channel string into a typed channel.
    pub fn parse(channel: &str) -> Option<Self> {
        match channel.split_once(':')? {
            ("user", id) => id.parse().ok().map(ChannelType::User),
            ("typing", id) => id.parse().ok().map(ChannelType::Typing),
            ("presence", "global") => Some(ChannelType::PresenceGlobal),
            _ => None,
        }
    }

    /// Converts back to a channel string.
    pub fn to_channel_string(&self) -> String {
        match self {
            ChannelType::User(id) => format!("user:{id}"),
            ChannelType::Typing(id) => format!("typing:{id}"),
            ChannelType::PresenceGlobal => "presence:global".to_string(),
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_channel_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_channels() {
        let user = UserId::new();
        let conversation = ConversationId::new();

        assert_eq!(
            ChannelType::parse(&format!("user:{user}")),
            Some(ChannelType::User(user))
        );
        assert_eq!(
            ChannelType::parse(&format!("typing:{conversation}")),
            Some(ChannelType::Typing(conversation))
        );
        assert_eq!(
            ChannelType::parse("presence:global"),
            Some(ChannelType::PresenceGlobal)
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(ChannelType::parse("admin:system"), None);
        assert_eq!(ChannelType::parse("typing:not-a-uuid"), None);
        assert_eq!(ChannelType::parse("presence"), None);
    }

    #[test]
    fn test_display_matches_parse() {
        let channel = ChannelType::Typing(ConversationId::new());
        assert_eq!(ChannelType::parse(&channel.to_string()), Some(channel));
    }
}
