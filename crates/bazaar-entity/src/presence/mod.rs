//! Presence domain entities.

pub mod model;

pub use model::PresenceRecord;

use serde::{Deserialize, Serialize};

/// Presence status for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// User has at least one live connection and is active.
    Online,
    /// User is connected but idle.
    Away,
    /// User is not connected.
    Offline,
}

impl PresenceStatus {
    /// Whether messages should be pushed live rather than queued as notifications.
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Away => "away",
            Self::Offline => "offline",
        }
    }
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresenceStatus {
    type Err = bazaar_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "away" => Ok(Self::Away),
            "offline" => Ok(Self::Offline),
            _ => Err(bazaar_core::AppError::validation(format!(
                "Invalid presence status: '{s}'"
            ))),
        }
    }
}
