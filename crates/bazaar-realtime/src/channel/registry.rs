//! Channel registry: all channels and their subscribers.

use std::collections::HashSet;

use dashmap::DashMap;

use crate::connection::handle::ConnectionId;

use super::subscription::SubscriptionTracker;
use super::types::ChannelType;

/// Registry of all active pub/sub channels.
///
/// Channels exist only while they have subscribers.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    /// Channel → subscribers.
    channels: DashMap<ChannelType, HashSet<ConnectionId>>,
    /// Connection → channels.
    subscriptions: SubscriptionTracker,
}

impl ChannelRegistry {
    /// Creates a new channel registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a connection to a channel. Returns `false` if already subscribed.
    pub fn subscribe(&self, channel: ChannelType, conn_id: ConnectionId) -> bool {
        let added = self
            .channels
            .entry(channel)
            .or_default()
            .insert(conn_id);
        self.subscriptions.add(conn_id, channel);
        added
    }

    /// Unsubscribes a connection from a channel. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, channel: &ChannelType, conn_id: ConnectionId) -> bool {
        let removed = self.detach(channel, conn_id);
        self.subscriptions.remove(conn_id, channel);
        removed
    }

    /// Unsubscribes a connection from all channels.
    pub fn unsubscribe_all(&self, conn_id: ConnectionId) {
        for channel in self.subscriptions.remove_all(conn_id) {
            self.detach(&channel, conn_id);
        }
    }

    fn detach(&self, channel: &ChannelType, conn_id: ConnectionId) -> bool {
        let Some(mut entry) = self.channels.get_mut(channel) else {
            return false;
        };
        let removed = entry.remove(&conn_id);
        if entry.is_empty() {
            drop(entry);
            self.channels.remove_if(channel, |_, subscribers| subscribers.is_empty());
        }
        removed
    }

    /// Returns all subscriber connection IDs for a channel.
    pub fn subscribers(&self, channel: &ChannelType) -> Vec<ConnectionId> {
        self.channels
            .get(channel)
            .map(|subscribers| subscribers.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether the connection is subscribed to the channel.
    pub fn is_subscribed(&self, channel: &ChannelType, conn_id: ConnectionId) -> bool {
        self.subscriptions.contains(conn_id, channel)
    }

    /// Returns the subscription count for a connection.
    pub fn subscription_count(&self, conn_id: ConnectionId) -> usize {
        self.subscriptions.count(conn_id)
    }

    /// Returns subscriber count for a channel.
    pub fn channel_subscriber_count(&self, channel: &ChannelType) -> usize {
        self.channels
            .get(channel)
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }

    /// Returns total number of active channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}
