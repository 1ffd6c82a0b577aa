//! Presence record value object.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::types::id::UserId;

use super::PresenceStatus;

/// The last known presence of a user. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// User ID.
    pub user_id: UserId,
    /// Current status.
    pub status: PresenceStatus,
    /// Last connect, status change, or heartbeat.
    pub last_seen: DateTime<Utc>,
}

impl PresenceRecord {
    /// Create a record stamped with the current time.
    pub fn new(user_id: UserId, status: PresenceStatus) -> Self {
        Self {
            user_id,
            status,
            last_seen: Utc::now(),
        }
    }

    /// Whether the record is still within its TTL window at `now`.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_seen) < ttl
    }

    /// Whether the user counts as online at `now`.
    pub fn is_online_at(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.status.is_online() && self.is_fresh(ttl, now)
    }
}
