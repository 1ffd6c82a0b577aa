//! Ping/pong heartbeat for WebSocket keepalive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;

use bazaar_core::config::RealtimeConfig;

use super::handle::ConnectionHandle;
use crate::message::builder::build_ping;

/// Heartbeat configuration
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// Timeout before considering connection dead
    pub ping_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(config.ping_interval_seconds.max(1)),
            ping_timeout: Duration::from_secs(config.ping_timeout_seconds.max(1)),
        }
    }
}

/// Run heartbeat loop for a connection.
///
/// Sends periodic pings and closes the connection if no pong arrives within
/// the timeout.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, config: HeartbeatConfig) {
    let mut interval = time::interval(config.ping_interval);
    // First tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;

        if !handle.is_alive() {
            break;
        }

        let elapsed = Utc::now() - handle.last_pong().await;
        if let Ok(elapsed) = elapsed.to_std() {
            if elapsed > config.ping_timeout {
                tracing::warn!(
                    conn_id = %handle.id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Heartbeat timeout"
                );
                handle.close();
                break;
            }
        }

        let ping = match serde_json::to_string(&build_ping()) {
            Ok(ping) => ping,
            Err(_) => break,
        };
        if handle.send(ping) == super::handle::SendOutcome::Closed {
            tracing::debug!(conn_id = %handle.id, "Ping send failed, closing");
            handle.close();
            break;
        }
    }

    tracing::debug!(conn_id = %handle.id, "Heartbeat loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::traits::identity::Identity;
    use bazaar_core::types::id::UserId;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_silent_connection_times_out() {
        let (tx, mut rx) = mpsc::channel(16);
        let identity = Identity {
            user_id: UserId::new(),
            display_name: "quiet".to_string(),
        };
        let handle = Arc::new(ConnectionHandle::new(&identity, tx));
        let config = HeartbeatConfig {
            ping_interval: Duration::from_secs(1),
            ping_timeout: Duration::from_millis(0),
        };

        // Paused time does not advance chrono's clock, so a zero timeout is
        // what makes the first check fail once real time has moved at all.
        std::thread::sleep(Duration::from_millis(5));
        run_heartbeat(handle.clone(), config).await;

        assert!(!handle.is_alive());
        assert!(rx.try_recv().is_err());
    }
}
