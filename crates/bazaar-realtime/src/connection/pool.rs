//! Connection pool: all active connections indexed by user ID.

use std::sync::Arc;

use dashmap::DashMap;

use bazaar_core::types::id::UserId;

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe pool of all active WebSocket connections.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// User ID → connection handles, oldest first.
    by_user: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
    /// Connection ID → connection handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection, evicting the user's oldest connections beyond `max_per_user`.
    ///
    /// Returns the evicted handles.
    pub fn add(&self, handle: Arc<ConnectionHandle>, max_per_user: usize) -> Vec<Arc<ConnectionHandle>> {
        let evicted = {
            let mut connections = self.by_user.entry(handle.user_id).or_default();
            connections.push(handle.clone());
            let excess = connections.len().saturating_sub(max_per_user.max(1));
            connections.drain(..excess).collect::<Vec<_>>()
        };

        self.by_id.insert(handle.id, handle);
        for old in &evicted {
            self.by_id.remove(&old.id);
        }
        evicted
    }

    /// Removes a connection.
    ///
    /// Returns the handle and whether it was the user's last connection.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<(Arc<ConnectionHandle>, bool)> {
        let (_, handle) = self.by_id.remove(conn_id)?;

        let mut was_last = true;
        if let Some(mut connections) = self.by_user.get_mut(&handle.user_id) {
            connections.retain(|c| c.id != *conn_id);
            was_last = connections.is_empty();
        }
        if was_last {
            self.by_user
                .remove_if(&handle.user_id, |_, connections| connections.is_empty());
        }
        Some((handle, was_last))
    }

    /// Gets all connections for a user.
    pub fn user_connections(&self, user_id: &UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Returns total number of active connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns number of unique connected users.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Returns all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Removes every connection.
    pub fn clear(&self) -> Vec<Arc<ConnectionHandle>> {
        let all = self.all_connections();
        self.by_id.clear();
        self.by_user.clear();
        all
    }
}
