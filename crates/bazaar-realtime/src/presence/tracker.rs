//! Presence tracker: TTL-bounded online/away/offline state per user.
//!
//! Records live in a moka cache whose time-to-live matches the presence TTL,
//! so a user who stops heartbeating drops out without an explicit offline
//! transition. Every write (connect, status change, heartbeat) restarts the
//! TTL window.

use std::time::Duration;

use chrono::Utc;
use moka::future::Cache;
use tracing::debug;

use bazaar_core::types::id::UserId;
use bazaar_entity::presence::{PresenceRecord, PresenceStatus};

/// Tracks presence state for all users.
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    records: Cache<UserId, PresenceRecord>,
    ttl: Duration,
}

impl PresenceTracker {
    /// Create a tracker whose records expire `ttl` after their last write.
    pub fn new(ttl: Duration) -> Self {
        let records = Cache::builder().time_to_live(ttl).build();
        Self { records, ttl }
    }

    /// Set a user's status and stamp it with the current time.
    pub async fn set(&self, user_id: UserId, status: PresenceStatus) -> PresenceRecord {
        let record = PresenceRecord::new(user_id, status);
        self.records.insert(user_id, record.clone()).await;
        debug!(user_id = %user_id, status = %status, "Presence updated");
        record
    }

    /// Refresh a user's last-seen time, keeping the current status.
    ///
    /// An explicit `offline` stays offline. A user with no live record
    /// becomes online. The flag reports whether the status differs from what
    /// the tracker held before, so callers can announce the change.
    pub async fn touch(&self, user_id: UserId) -> (PresenceRecord, bool) {
        let mut previous = None;
        let record = self
            .records
            .entry(user_id)
            .and_upsert_with(|existing| {
                previous = existing.map(|entry| entry.into_value().status);
                let status = previous.unwrap_or(PresenceStatus::Online);
                std::future::ready(PresenceRecord::new(user_id, status))
            })
            .await
            .into_value();
        let changed = previous != Some(record.status);
        (record, changed)
    }

    /// The user's current record, if one is within the TTL.
    pub async fn get(&self, user_id: UserId) -> Option<PresenceRecord> {
        let now = Utc::now();
        self.records
            .get(&user_id)
            .await
            .filter(|record| record.is_fresh(self.chrono_ttl(), now))
    }

    /// The user's effective status. Unknown or expired users are offline.
    pub async fn status(&self, user_id: UserId) -> PresenceStatus {
        self.get(user_id)
            .await
            .map(|record| record.status)
            .unwrap_or(PresenceStatus::Offline)
    }

    /// Whether live delivery should be attempted for a user.
    ///
    /// Only a fresh `online` record counts. `away` users get fallback
    /// notifications.
    pub async fn is_online(&self, user_id: UserId) -> bool {
        self.status(user_id).await.is_online()
    }

    /// Every user currently online.
    pub fn all_online(&self) -> Vec<PresenceRecord> {
        let ttl = self.chrono_ttl();
        let now = Utc::now();
        self.records
            .iter()
            .map(|(_, record)| record)
            .filter(|record| record.is_online_at(ttl, now))
            .collect()
    }

    /// Number of users currently online.
    pub fn online_count(&self) -> usize {
        self.all_online().len()
    }

    /// Evict expired records.
    pub async fn sweep(&self) {
        self.records.run_pending_tasks().await;
    }

    /// The configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn chrono_ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX)
    }
}
