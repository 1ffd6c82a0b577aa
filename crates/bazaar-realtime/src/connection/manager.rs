//! Connection manager: connection lifecycle and frame routing.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use bazaar_core::config::RealtimeConfig;
use bazaar_core::error::AppError;
use bazaar_core::traits::identity::Identity;
use bazaar_core::types::id::UserId;

use crate::channel::registry::ChannelRegistry;
use crate::channel::types::ChannelType;
use crate::message::types::OutboundMessage;
use crate::metrics::EngineMetrics;

use super::handle::{ConnectionHandle, ConnectionId};
use super::pool::ConnectionPool;

/// A connection removed from the manager.
#[derive(Debug, Clone)]
pub struct Departure {
    /// The removed connection.
    pub handle: Arc<ConnectionHandle>,
    /// Whether the user has no connections left.
    pub was_last: bool,
}

/// Manages all active WebSocket connections.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Connection pool.
    pool: ConnectionPool,
    /// Channel registry.
    channels: Arc<ChannelRegistry>,
    /// Metrics.
    metrics: Arc<EngineMetrics>,
    /// Configuration.
    config: RealtimeConfig,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(
        config: RealtimeConfig,
        channels: Arc<ChannelRegistry>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            pool: ConnectionPool::new(),
            channels,
            metrics,
            config,
        }
    }

    /// Registers a new authenticated connection.
    ///
    /// Returns the connection handle and a receiver for outbound frames. When
    /// the user is at the connection cap the oldest connection is closed.
    pub fn register(&self, identity: &Identity) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.config.outbound_buffer_size.max(1));
        let handle = Arc::new(ConnectionHandle::new(identity, tx));

        let evicted = self
            .pool
            .add(handle.clone(), self.config.max_connections_per_user);
        for old in evicted {
            warn!(
                user_id = %old.user_id,
                conn_id = %old.id,
                max = self.config.max_connections_per_user,
                "User at max connections, closing oldest"
            );
            self.channels.unsubscribe_all(old.id);
            old.close();
            self.metrics.connection_closed();
        }

        self.channels
            .subscribe(ChannelType::User(identity.user_id), handle.id);
        self.metrics.connection_opened();

        info!(
            conn_id = %handle.id,
            user_id = %identity.user_id,
            "WebSocket connection registered"
        );

        (handle, rx)
    }

    /// Unregisters a connection and cleans up its subscriptions.
    ///
    /// Returns `None` when the connection was already removed (for example
    /// evicted by the connection cap).
    pub fn unregister(&self, conn_id: &ConnectionId) -> Option<Departure> {
        let (handle, was_last) = self.pool.remove(conn_id)?;
        handle.mark_dead();
        self.channels.unsubscribe_all(*conn_id);
        self.metrics.connection_closed();

        info!(
            conn_id = %conn_id,
            user_id = %handle.user_id,
            was_last,
            "WebSocket connection unregistered"
        );

        Some(Departure { handle, was_last })
    }

    /// Sends a frame to every live connection of a user.
    ///
    /// Returns how many connections accepted it.
    pub fn send_to_user(&self, user_id: &UserId, message: &OutboundMessage) -> usize {
        let targets = self.pool.user_connections(user_id);
        self.fan_out(targets, message)
    }

    /// Sends a frame to a single connection.
    pub fn send_to_connection(&self, conn_id: &ConnectionId, message: &OutboundMessage) -> bool {
        match self.pool.get(conn_id) {
            Some(handle) => self.fan_out(vec![handle], message) == 1,
            None => false,
        }
    }

    /// Sends a frame directly on a handle, even if it is not pooled.
    pub fn send_to_handle(&self, handle: &ConnectionHandle, message: &OutboundMessage) -> bool {
        let frame = match serde_json::to_string(message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(kind = message.kind(), error = %e, "Failed to serialize frame");
                return false;
            }
        };
        let queued = handle.send(frame).is_queued();
        self.metrics.frames_queued(1, usize::from(queued));
        queued
    }

    /// Broadcasts a frame to every subscriber of a channel.
    pub fn broadcast(&self, channel: &ChannelType, message: &OutboundMessage) -> usize {
        let targets = self
            .channels
            .subscribers(channel)
            .into_iter()
            .filter_map(|id| self.pool.get(&id))
            .collect();
        self.fan_out(targets, message)
    }

    /// Broadcasts a frame to every subscriber of a channel except one connection.
    pub fn broadcast_except(
        &self,
        channel: &ChannelType,
        message: &OutboundMessage,
        exclude: ConnectionId,
    ) -> usize {
        let targets = self
            .channels
            .subscribers(channel)
            .into_iter()
            .filter(|id| *id != exclude)
            .filter_map(|id| self.pool.get(&id))
            .collect();
        self.fan_out(targets, message)
    }

    fn fan_out(&self, targets: Vec<Arc<ConnectionHandle>>, message: &OutboundMessage) -> usize {
        if targets.is_empty() {
            return 0;
        }
        let frame = match serde_json::to_string(message) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(kind = message.kind(), error = %e, "Failed to serialize frame");
                return 0;
            }
        };

        let attempted = targets.len();
        let queued = targets
            .iter()
            .filter(|handle| handle.send(frame.clone()).is_queued())
            .count();
        self.metrics.frames_queued(attempted, queued);

        debug!(kind = message.kind(), attempted, queued, "Frame fanned out");
        queued
    }

    /// Subscribes a connection to a channel, enforcing the per-connection limit.
    ///
    /// Returns `false` if it was already subscribed. Fails when the connection
    /// is no longer pooled, so an evicted or closed connection never leaves a
    /// registry entry behind.
    pub fn subscribe(&self, conn_id: ConnectionId, channel: ChannelType) -> Result<bool, AppError> {
        if self.pool.get(&conn_id).is_none() {
            return Err(AppError::not_found("Connection is closed"));
        }
        if self.channels.is_subscribed(&channel, conn_id) {
            return Ok(false);
        }
        if self.channels.subscription_count(conn_id) >= self.config.max_subscriptions_per_connection
        {
            return Err(AppError::validation(format!(
                "Maximum of {} subscriptions per connection reached",
                self.config.max_subscriptions_per_connection
            )));
        }
        let added = self.channels.subscribe(channel, conn_id);
        // Eviction may have run between the pool check and the insert.
        if self.pool.get(&conn_id).is_none() {
            self.channels.unsubscribe(&channel, conn_id);
            return Err(AppError::not_found("Connection is closed"));
        }
        Ok(added)
    }

    /// Unsubscribes a connection from a channel.
    pub fn unsubscribe(&self, conn_id: ConnectionId, channel: &ChannelType) -> bool {
        self.channels.unsubscribe(channel, conn_id)
    }

    /// Whether a user has at least one pooled connection.
    pub fn is_connected(&self, user_id: &UserId) -> bool {
        !self.pool.user_connections(user_id).is_empty()
    }

    /// Gets a connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.pool.get(conn_id)
    }

    /// Returns total number of active connections.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Returns number of unique connected users.
    pub fn user_count(&self) -> usize {
        self.pool.user_count()
    }

    /// Closes every connection.
    pub fn close_all(&self) {
        let all = self.pool.clear();
        let count = all.len();
        for handle in all {
            self.channels.unsubscribe_all(handle.id);
            handle.close();
            self.metrics.connection_closed();
        }
        info!(count, "All WebSocket connections closed");
    }

    /// Realtime configuration in effect.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(config: RealtimeConfig) -> ConnectionManager {
        ConnectionManager::new(
            config,
            Arc::new(ChannelRegistry::new()),
            Arc::new(EngineMetrics::new()),
        )
    }

    fn identity(user_id: UserId) -> Identity {
        Identity {
            user_id,
            display_name: "user".to_string(),
        }
    }

    #[test]
    fn test_send_to_user_reaches_every_connection() {
        let manager = manager(RealtimeConfig::default());
        let user = UserId::new();
        let (_h1, mut rx1) = manager.register(&identity(user));
        let (_h2, mut rx2) = manager.register(&identity(user));

        let sent = manager.send_to_user(&user, &OutboundMessage::UnreadCount { count: 3 });
        assert_eq!(sent, 2);
        assert!(rx1.try_recv().is_ok());
        assert!(rx2.try_recv().is_ok());
    }

    #[test]
    fn test_register_subscribes_private_channel() {
        let manager = manager(RealtimeConfig::default());
        let user = UserId::new();
        let (handle, mut rx) = manager.register(&identity(user));

        let sent = manager.broadcast(&ChannelType::User(user), &OutboundMessage::UnreadCount { count: 1 });
        assert_eq!(sent, 1);
        let frame = rx.try_recv().expect("frame");
        assert!(frame.contains("unread_count"));

        let departure = manager.unregister(&handle.id).expect("registered");
        assert!(departure.was_last);
        assert_eq!(manager.broadcast(&ChannelType::User(user), &OutboundMessage::UnreadCount { count: 1 }), 0);
    }

    #[test]
    fn test_cap_closes_oldest() {
        let config = RealtimeConfig {
            max_connections_per_user: 1,
            ..RealtimeConfig::default()
        };
        let manager = manager(config);
        let user = UserId::new();
        let (first, _rx1) = manager.register(&identity(user));
        let (_second, _rx2) = manager.register(&identity(user));

        assert!(!first.is_alive());
        assert_eq!(manager.connection_count(), 1);
        assert!(manager.unregister(&first.id).is_none());
    }

    #[test]
    fn test_subscription_limit() {
        let config = RealtimeConfig {
            max_subscriptions_per_connection: 2,
            ..RealtimeConfig::default()
        };
        let manager = manager(config);
        let (handle, _rx) = manager.register(&identity(UserId::new()));

        assert!(manager.subscribe(handle.id, ChannelType::PresenceGlobal).expect("ok"));
        assert!(!manager.subscribe(handle.id, ChannelType::PresenceGlobal).expect("ok"));
        let err = manager
            .subscribe(handle.id, ChannelType::Typing(bazaar_core::types::id::ConversationId::new()))
            .expect_err("limit");
        assert_eq!(err.kind, bazaar_core::error::ErrorKind::Validation);
    }

    #[test]
    fn test_evicted_connection_cannot_subscribe() {
        let config = RealtimeConfig {
            max_connections_per_user: 1,
            ..RealtimeConfig::default()
        };
        let manager = manager(config);
        let user = UserId::new();
        let (old, _old_rx) = manager.register(&identity(user));
        let (_new, _new_rx) = manager.register(&identity(user));

        let typing = ChannelType::Typing(bazaar_core::types::id::ConversationId::new());
        let err = manager.subscribe(old.id, typing).expect_err("closed");
        assert_eq!(err.kind, bazaar_core::error::ErrorKind::NotFound);
        assert_eq!(manager.channels.channel_subscriber_count(&typing), 0);
        assert_eq!(manager.channels.subscription_count(old.id), 0);
    }
}
