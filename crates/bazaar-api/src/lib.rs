//! # bazaar-api
//!
//! HTTP API layer for Bazaar Messenger built on Axum.
//!
//! Provides the REST endpoints for conversations, history, read state and
//! presence, the authenticated WebSocket upgrade, bearer token verification,
//! extractors, DTOs, and error mapping.

pub mod app;
pub mod auth;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::{AppState, StorageBackend};
