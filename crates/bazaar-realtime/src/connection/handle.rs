//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, RwLock, mpsc};
use uuid::Uuid;

use bazaar_core::traits::identity::Identity;
use bazaar_core::types::id::UserId;

/// Unique connection identifier.
pub type ConnectionId = Uuid;

/// Result of queueing a frame on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The frame is in the outbound queue.
    Queued,
    /// The queue is full; the frame was dropped.
    Dropped,
    /// The connection is gone.
    Closed,
}

impl SendOutcome {
    /// Whether the frame was accepted.
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued)
    }
}

/// A handle to a single WebSocket connection.
///
/// Holds the bounded sender feeding the socket writer, plus metadata about
/// the connected user. Sending never waits: a full queue drops the frame.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// User who owns this connection.
    pub user_id: UserId,
    /// Display name (cached for typing and notifications).
    pub display_name: String,
    /// Sender for serialized outbound frames.
    sender: mpsc::Sender<String>,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    /// Last pong received.
    last_pong: RwLock<DateTime<Utc>>,
    /// Whether the connection is still alive.
    alive: AtomicBool,
    /// Wakes the socket task when the server closes the connection.
    close_signal: Notify,
}

impl ConnectionHandle {
    /// Create a new connection handle.
    pub fn new(identity: &Identity, sender: mpsc::Sender<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: identity.user_id,
            display_name: identity.display_name.clone(),
            sender,
            connected_at: now,
            last_pong: RwLock::new(now),
            alive: AtomicBool::new(true),
            close_signal: Notify::new(),
        }
    }

    /// Queue a serialized frame without waiting.
    pub fn send(&self, frame: String) -> SendOutcome {
        if !self.is_alive() {
            return SendOutcome::Closed;
        }
        match self.sender.try_send(frame) {
            Ok(()) => SendOutcome::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping frame");
                SendOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                SendOutcome::Closed
            }
        }
    }

    /// Check if connection is alive.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as dead.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Mark the connection dead and wake the task serving it.
    pub fn close(&self) {
        self.mark_dead();
        self.close_signal.notify_one();
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        if !self.is_alive() {
            return;
        }
        self.close_signal.notified().await;
    }

    /// Record a pong response.
    pub async fn record_pong(&self) {
        *self.last_pong.write().await = Utc::now();
    }

    /// When the last pong arrived.
    pub async fn last_pong(&self) -> DateTime<Utc> {
        *self.last_pong.read().await
    }

    /// Get a snapshot of connection info.
    pub async fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id,
            user_id: self.user_id,
            display_name: self.display_name.clone(),
            connected_at: self.connected_at,
            last_pong: self.last_pong().await,
            alive: self.is_alive(),
        }
    }
}

/// Snapshot of connection info (serializable).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Connection ID.
    pub id: ConnectionId,
    /// User ID.
    pub user_id: UserId,
    /// Display name.
    pub display_name: String,
    /// Connected at.
    pub connected_at: DateTime<Utc>,
    /// Last pong.
    pub last_pong: DateTime<Utc>,
    /// Is alive.
    pub alive: bool,
}
