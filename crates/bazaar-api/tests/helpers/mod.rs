//! Shared helpers for API integration tests.
//!
//! Every test gets its own in-memory backend; tokens are signed with the
//! same secret the resolver verifies with.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use tower::ServiceExt;

use bazaar_api::auth::{Claims, JwtIdentityResolver};
use bazaar_api::{AppState, StorageBackend, build_app};
use bazaar_core::config::{AuthConfig, ChatConfig, CorsConfig};
use bazaar_core::types::id::{ConversationId, UserId};
use bazaar_realtime::server::EngineSettings;
use bazaar_service::OutgoingMessage;

const TEST_SECRET: &str = "integration-test-secret";

/// Test application context
pub struct TestApp {
    /// The Axum app under test
    pub router: Router,
    /// State shared with the router, for seeding data directly
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application on the in-memory backend
    pub fn new() -> Self {
        let auth = AuthConfig {
            jwt_secret: TEST_SECRET.to_string(),
            leeway_seconds: 0,
        };
        let state = AppState::new(
            StorageBackend::memory(),
            Arc::new(JwtIdentityResolver::new(&auth)),
            ChatConfig::default(),
            EngineSettings::default(),
            None,
        );
        let router = build_app(state.clone(), &CorsConfig::default());
        Self { router, state }
    }

    /// Sign a token for `user` valid for one hour
    pub fn token_for(&self, user: UserId, name: &str) -> String {
        let claims = Claims {
            sub: user,
            name: Some(name.to_string()),
            exp: chrono::Utc::now().timestamp() + 3600,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .expect("Failed to sign token")
    }

    /// Start (or resolve) a conversation through the API and return its id
    pub async fn start_conversation(&self, token: &str, other: UserId) -> ConversationId {
        let response = self
            .request(
                "POST",
                "/api/conversations",
                Some(serde_json::json!({ "other_user_id": other })),
                Some(token),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.data()["id"]
            .as_str()
            .and_then(|id| id.parse().ok())
            .expect("conversation id in response")
    }

    /// Store a text message directly through the message service
    pub async fn seed_message(&self, conversation: ConversationId, sender: UserId, text: &str) {
        self.state
            .messages
            .append(conversation, sender, OutgoingMessage::text(text))
            .await
            .expect("Failed to seed message");
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// The `error` code of a failure envelope
    pub fn error_code(&self) -> Option<&str> {
        self.body["error"].as_str()
    }
}
