//! Route definitions for the Bazaar HTTP API.
//!
//! REST routes are mounted under `/api`; the WebSocket upgrade lives at `/ws`.

use axum::Router;
use axum::routing::{delete, get, post};

use crate::handlers;
use crate::state::AppState;

/// Build the router with every route, threading `AppState` through.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(conversation_routes())
        .merge(message_routes())
        .merge(presence_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_handler))
        .with_state(state)
}

/// Conversation endpoints: start-or-get, list, history, read, deactivate
fn conversation_routes() -> Router<AppState> {
    use handlers::conversation::*;
    Router::new()
        .route(
            "/conversations",
            post(create_conversation).get(list_conversations),
        )
        .route("/conversations/{id}", delete(deactivate_conversation))
        .route("/conversations/{id}/messages", get(list_messages))
        .route("/conversations/{id}/read", post(mark_read))
}

/// Message endpoints
fn message_routes() -> Router<AppState> {
    Router::new().route(
        "/messages/unread-count",
        get(handlers::message::unread_count),
    )
}

/// Presence endpoints
fn presence_routes() -> Router<AppState> {
    Router::new().route("/presence/online", get(handlers::presence::online_users))
}

/// Health endpoints
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
}
