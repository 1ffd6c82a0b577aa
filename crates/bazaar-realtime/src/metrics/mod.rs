//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Total connections established
    pub connections_total: AtomicU64,
    /// Connections currently active
    pub connections_active: AtomicU64,
    /// Inbound frames received
    pub frames_received: AtomicU64,
    /// Outbound frames queued
    pub frames_sent: AtomicU64,
    /// Outbound frames dropped on full or closed queues
    pub frames_dropped: AtomicU64,
    /// Chat messages stored
    pub messages_persisted: AtomicU64,
    /// Chat messages that failed to store
    pub persistence_failures: AtomicU64,
    /// Chat messages pushed to at least one live connection
    pub pushes_delivered: AtomicU64,
    /// Fallback notifications created
    pub fallbacks_created: AtomicU64,
    /// Fallback notifications that failed or timed out
    pub fallbacks_failed: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    fn inc(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// A connection was registered.
    pub fn connection_opened(&self) {
        Self::inc(&self.connections_total);
        Self::inc(&self.connections_active);
    }

    /// A connection was unregistered.
    pub fn connection_closed(&self) {
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    /// An inbound frame arrived.
    pub fn frame_received(&self) {
        Self::inc(&self.frames_received);
    }

    /// Record the outcome of queueing `attempted` frames of which `queued` succeeded.
    pub fn frames_queued(&self, attempted: usize, queued: usize) {
        self.frames_sent.fetch_add(queued as u64, Ordering::Relaxed);
        self.frames_dropped
            .fetch_add(attempted.saturating_sub(queued) as u64, Ordering::Relaxed);
    }

    /// A chat message was stored.
    pub fn message_persisted(&self) {
        Self::inc(&self.messages_persisted);
    }

    /// A chat message could not be stored.
    pub fn persistence_failed(&self) {
        Self::inc(&self.persistence_failures);
    }

    /// A chat message reached a live connection.
    pub fn push_delivered(&self) {
        Self::inc(&self.pushes_delivered);
    }

    /// A fallback notification was created.
    pub fn fallback_created(&self) {
        Self::inc(&self.fallbacks_created);
    }

    /// A fallback notification failed.
    pub fn fallback_failed(&self) {
        Self::inc(&self.fallbacks_failed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            messages_persisted: self.messages_persisted.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
            pushes_delivered: self.pushes_delivered.load(Ordering::Relaxed),
            fallbacks_created: self.fallbacks_created.load(Ordering::Relaxed),
            fallbacks_failed: self.fallbacks_failed.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total connections ever established
    pub connections_total: u64,
    /// Currently active connections
    pub connections_active: u64,
    /// Inbound frames received
    pub frames_received: u64,
    /// Outbound frames queued
    pub frames_sent: u64,
    /// Outbound frames dropped
    pub frames_dropped: u64,
    /// Chat messages stored
    pub messages_persisted: u64,
    /// Chat messages that failed to store
    pub persistence_failures: u64,
    /// Chat messages pushed live
    pub pushes_delivered: u64,
    /// Fallback notifications created
    pub fallbacks_created: u64,
    /// Fallback notifications failed
    pub fallbacks_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_connections_never_underflow() {
        let metrics = EngineMetrics::new();
        metrics.connection_opened();
        metrics.connection_closed();
        metrics.connection_closed();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.connections_total, 1);
        assert_eq!(snapshot.connections_active, 0);
    }

    #[test]
    fn test_frames_queued_counts_drops() {
        let metrics = EngineMetrics::new();
        metrics.frames_queued(3, 2);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.frames_sent, 2);
        assert_eq!(snapshot.frames_dropped, 1);
    }
}
