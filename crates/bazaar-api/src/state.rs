//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use bazaar_core::config::ChatConfig;
use bazaar_core::traits::identity::IdentityResolver;
use bazaar_database::DatabasePool;
use bazaar_database::memory::{MemoryNotificationSink, MemoryProductCatalog, MemoryStore};
use bazaar_database::repositories::{
    ConversationRepository, MessageRepository, PgConversationRepository, PgMessageRepository,
    PgNotificationSink, PgProductCatalog,
};
use bazaar_realtime::server::{Collaborators, EngineSettings};
use bazaar_realtime::RealtimeEngine;
use bazaar_service::{ConversationService, MessageService};

/// Storage and collaborator implementations the server runs on.
#[derive(Debug, Clone)]
pub struct StorageBackend {
    /// Conversation storage.
    pub conversations: Arc<dyn ConversationRepository>,
    /// Message storage.
    pub messages: Arc<dyn MessageRepository>,
    /// Product catalog and notification inbox.
    pub collaborators: Collaborators,
}

impl StorageBackend {
    /// Everything in process memory. Nothing survives a restart.
    pub fn memory() -> Self {
        let store = MemoryStore::new();
        Self {
            conversations: Arc::new(store.clone()),
            messages: Arc::new(store),
            collaborators: Collaborators {
                catalog: Arc::new(MemoryProductCatalog::new()),
                notifications: Arc::new(MemoryNotificationSink::new()),
            },
        }
    }

    /// PostgreSQL repositories sharing one pool.
    pub fn postgres(db: &DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            conversations: Arc::new(PgConversationRepository::new(pool.clone())),
            messages: Arc::new(PgMessageRepository::new(pool.clone())),
            collaborators: Collaborators {
                catalog: Arc::new(PgProductCatalog::new(pool.clone())),
                notifications: Arc::new(PgNotificationSink::new(pool)),
            },
        }
    }
}

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Bearer token verification.
    pub identity: Arc<dyn IdentityResolver>,
    /// Conversation directory.
    pub conversations: ConversationService,
    /// Message store.
    pub messages: MessageService,
    /// WebSocket realtime engine.
    pub realtime: RealtimeEngine,
    /// Pagination and content limits.
    pub chat: ChatConfig,
    /// Database pool, absent for the in-memory backend.
    pub database: Option<DatabasePool>,
    /// When the process started serving.
    pub started_at: Instant,
}

impl AppState {
    /// Wire services and the realtime engine over a storage backend.
    pub fn new(
        backend: StorageBackend,
        identity: Arc<dyn IdentityResolver>,
        chat: ChatConfig,
        settings: EngineSettings,
        database: Option<DatabasePool>,
    ) -> Self {
        let conversations = ConversationService::new(backend.conversations);
        let messages = MessageService::new(
            conversations.clone(),
            backend.messages,
            chat.max_content_length,
        );
        let realtime = RealtimeEngine::new(
            conversations.clone(),
            messages.clone(),
            backend.collaborators,
            settings,
        );

        Self {
            identity,
            conversations,
            messages,
            realtime,
            chat,
            database,
            started_at: Instant::now(),
        }
    }
}
