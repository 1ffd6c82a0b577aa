//! HTTP and WebSocket handlers.

pub mod conversation;
pub mod health;
pub mod message;
pub mod presence;
pub mod ws;
