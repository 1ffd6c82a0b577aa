//! Reverse index from connections to their channels.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

use super::types::ChannelType;

/// Tracks which channels each connection is subscribed to.
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    /// Connection ID → subscribed channels.
    by_connection: DashMap<ConnectionId, HashSet<ChannelType>>,
}

impl SubscriptionTracker {
    /// Creates a new subscription tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a subscription.
    pub fn add(&self, conn_id: ConnectionId, channel: ChannelType) {
        self.by_connection.entry(conn_id).or_default().insert(channel);
    }

    /// Removes a subscription.
    pub fn remove(&self, conn_id: ConnectionId, channel: &ChannelType) {
        if let Some(mut channels) = self.by_connection.get_mut(&conn_id) {
            channels.remove(channel);
        }
    }

    /// Whether the connection is subscribed to the channel.
    pub fn contains(&self, conn_id: ConnectionId, channel: &ChannelType) -> bool {
        self.by_connection
            .get(&conn_id)
            .is_some_and(|channels| channels.contains(channel))
    }

    /// Returns the number of subscriptions for a connection.
    pub fn count(&self, conn_id: ConnectionId) -> usize {
        self.by_connection
            .get(&conn_id)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    /// Removes and returns all subscriptions of a connection.
    pub fn remove_all(&self, conn_id: ConnectionId) -> HashSet<ChannelType> {
        self.by_connection
            .remove(&conn_id)
            .map(|(_, channels)| channels)
            .unwrap_or_default()
    }
}
