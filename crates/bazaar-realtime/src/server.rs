//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use bazaar_core::config::{NotificationsConfig, PresenceConfig, RealtimeConfig};
use bazaar_core::traits::catalog::ProductCatalog;
use bazaar_core::traits::notify::NotificationSink;
use bazaar_service::{ConversationService, MessageService};

use crate::channel::registry::ChannelRegistry;
use crate::connection::manager::ConnectionManager;
use crate::dispatch::dispatcher::ChatDispatcher;
use crate::metrics::EngineMetrics;
use crate::notification::fallback::NotificationFallback;
use crate::presence::tracker::PresenceTracker;

/// Configuration sections the engine reads.
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    /// Connection and frame limits.
    pub realtime: RealtimeConfig,
    /// Presence TTL and sweep cadence.
    pub presence: PresenceConfig,
    /// Fallback notification formatting and timeout.
    pub notifications: NotificationsConfig,
}

/// External collaborators the engine calls out to.
#[derive(Debug, Clone)]
pub struct Collaborators {
    /// Product snippets for chat payloads.
    pub catalog: Arc<dyn ProductCatalog>,
    /// Durable notification inbox.
    pub notifications: Arc<dyn NotificationSink>,
}

/// Central real-time engine that coordinates all WebSocket subsystems.
#[derive(Debug, Clone)]
pub struct RealtimeEngine {
    /// Connection manager.
    pub connections: Arc<ConnectionManager>,
    /// Channel registry.
    pub channels: Arc<ChannelRegistry>,
    /// Presence tracker.
    pub presence: PresenceTracker,
    /// Chat dispatcher.
    pub dispatcher: Arc<ChatDispatcher>,
    /// Metrics collector.
    pub metrics: Arc<EngineMetrics>,
    /// Settings in effect.
    settings: EngineSettings,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl RealtimeEngine {
    /// Creates a new real-time engine with all subsystems.
    pub fn new(
        conversations: ConversationService,
        messages: MessageService,
        collaborators: Collaborators,
        settings: EngineSettings,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let metrics = Arc::new(EngineMetrics::new());
        let channels = Arc::new(ChannelRegistry::new());
        let presence = PresenceTracker::new(Duration::from_secs(settings.presence.ttl_seconds));
        let connections = Arc::new(ConnectionManager::new(
            settings.realtime.clone(),
            channels.clone(),
            metrics.clone(),
        ));
        let fallback = NotificationFallback::new(
            collaborators.notifications,
            settings.notifications.clone(),
            metrics.clone(),
        );
        let dispatcher = Arc::new(ChatDispatcher::new(
            conversations,
            messages,
            collaborators.catalog,
            presence.clone(),
            connections.clone(),
            fallback,
            metrics.clone(),
        ));

        info!(
            presence_ttl_seconds = settings.presence.ttl_seconds,
            max_connections_per_user = settings.realtime.max_connections_per_user,
            "Real-time engine initialized"
        );

        Self {
            connections,
            channels,
            presence,
            dispatcher,
            metrics,
            settings,
            shutdown_tx,
        }
    }

    /// Starts background maintenance (presence sweep).
    pub fn start(&self) -> JoinHandle<()> {
        let presence = self.presence.clone();
        let period = Duration::from_secs(self.settings.presence.sweep_interval_seconds.max(1));
        let mut shutdown = self.shutdown_receiver();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        presence.sweep().await;
                        debug!(online = presence.online_count(), "Presence sweep completed");
                    }
                    _ = shutdown.recv() => break,
                }
            }
            debug!("Presence sweep loop stopped");
        })
    }

    /// Settings in effect.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiates a graceful shutdown of the real-time engine.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        let _ = self.shutdown_tx.send(());
        self.connections.close_all();
        info!("Real-time engine shut down");
    }
}
