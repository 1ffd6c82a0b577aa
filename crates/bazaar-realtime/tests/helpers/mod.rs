//! Shared helpers for realtime integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use bazaar_core::config::{NotificationsConfig, PresenceConfig, RealtimeConfig};
use bazaar_core::traits::identity::Identity;
use bazaar_core::types::id::{ConversationId, ProductId, UserId};
use bazaar_database::memory::{MemoryNotificationSink, MemoryProductCatalog, MemoryStore};
use bazaar_entity::conversation::Conversation;
use bazaar_realtime::connection::ConnectionHandle;
use bazaar_realtime::server::{Collaborators, EngineSettings};
use bazaar_realtime::RealtimeEngine;
use bazaar_service::{ConversationService, MessageService};

/// An engine wired to in-memory collaborators.
pub struct TestEngine {
    pub engine: RealtimeEngine,
    pub store: MemoryStore,
    pub sink: Arc<MemoryNotificationSink>,
    pub catalog: Arc<MemoryProductCatalog>,
    pub conversations: ConversationService,
    pub messages: MessageService,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_settings(EngineSettings {
            realtime: RealtimeConfig::default(),
            presence: PresenceConfig::default(),
            notifications: NotificationsConfig::default(),
        })
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        let store = MemoryStore::new();
        let sink = Arc::new(MemoryNotificationSink::new());
        let catalog = Arc::new(MemoryProductCatalog::new());
        let conversations = ConversationService::new(Arc::new(store.clone()));
        let messages = MessageService::new(conversations.clone(), Arc::new(store.clone()), 4000);
        let collaborators = Collaborators {
            catalog: catalog.clone(),
            notifications: sink.clone(),
        };
        let engine = RealtimeEngine::new(
            conversations.clone(),
            messages.clone(),
            collaborators,
            settings,
        );
        Self {
            engine,
            store,
            sink,
            catalog,
            conversations,
            messages,
        }
    }

    /// Open a connection for a user, discarding the connect-time frames.
    pub async fn connect(&self, user: &TestUser) -> TestClient {
        let (handle, rx) = self.engine.dispatcher.on_connect(&user.identity()).await;
        let mut client = TestClient { handle, rx };
        client.drain();
        client
    }

    pub async fn conversation(
        &self,
        a: &TestUser,
        b: &TestUser,
        product_id: Option<ProductId>,
    ) -> Conversation {
        self.conversations
            .resolve_or_create(a.id, b.id, product_id, None)
            .await
            .expect("conversation")
    }

    /// Feed a JSON frame to the dispatcher as if `client` sent it.
    pub async fn send(&self, client: &TestClient, frame: Value) {
        self.engine
            .dispatcher
            .handle_inbound(&client.handle, &frame.to_string())
            .await;
    }

    pub async fn chat(&self, client: &TestClient, conversation_id: ConversationId, content: &str) {
        self.send(
            client,
            serde_json::json!({
                "type": "chat_send",
                "conversation_id": conversation_id,
                "content": content,
                "client_ref": "ref-1",
            }),
        )
        .await;
    }
}

#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: UserId,
    pub name: String,
}

impl TestUser {
    pub fn new(name: &str) -> Self {
        Self {
            id: UserId::new(),
            name: name.to_string(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id,
            display_name: self.name.clone(),
        }
    }
}

/// One open connection and the frames queued for it.
pub struct TestClient {
    pub handle: Arc<ConnectionHandle>,
    pub rx: mpsc::Receiver<String>,
}

impl TestClient {
    /// Take every frame queued so far.
    pub fn drain(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(raw) = self.rx.try_recv() {
            frames.push(serde_json::from_str(&raw).expect("frames are JSON"));
        }
        frames
    }

    /// Take every queued frame of one `type`.
    pub fn frames_of(&mut self, kind: &str) -> Vec<Value> {
        self.drain()
            .into_iter()
            .filter(|frame| frame["type"] == kind)
            .collect()
    }
}

/// The `status` field of every `message_status` frame, in order.
pub fn statuses(frames: &[Value]) -> Vec<String> {
    frames
        .iter()
        .filter(|frame| frame["type"] == "message_status")
        .map(|frame| frame["status"].as_str().unwrap_or_default().to_string())
        .collect()
}
