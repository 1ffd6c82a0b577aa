//! Message kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a message carries.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "message_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text.
    #[default]
    Text,
    /// An image attachment.
    Image,
    /// A file attachment.
    File,
    /// A shared product listing.
    Product,
    /// Generated by the platform rather than a participant.
    System,
}

impl MessageKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::File => "file",
            Self::Product => "product",
            Self::System => "system",
        }
    }

    /// Preview text used instead of the content, for kinds whose content is not readable prose.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            Self::Image => Some("[image]"),
            Self::File => Some("[file]"),
            Self::Product => Some("[product]"),
            Self::Text | Self::System => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = bazaar_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "file" => Ok(Self::File),
            "product" => Ok(Self::Product),
            "system" => Ok(Self::System),
            _ => Err(bazaar_core::AppError::validation(format!(
                "Invalid message kind: '{s}'. Expected one of: text, image, file, product, system"
            ))),
        }
    }
}
