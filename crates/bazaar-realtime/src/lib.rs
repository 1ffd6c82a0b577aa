//! # bazaar-realtime
//!
//! Real-time delivery engine for Bazaar Messenger. Provides:
//!
//! - WebSocket connection management with bounded per-connection queues
//! - Typed pub/sub channels (private user channels, typing topics, global presence)
//! - The chat delivery dispatcher: persist, push or fall back, acknowledge
//! - TTL-based presence tracking
//! - Durable notification fallback for unreachable recipients

pub mod channel;
pub mod connection;
pub mod dispatch;
pub mod message;
pub mod metrics;
pub mod notification;
pub mod presence;
pub mod server;

pub use channel::registry::ChannelRegistry;
pub use connection::manager::ConnectionManager;
pub use dispatch::dispatcher::ChatDispatcher;
pub use notification::fallback::NotificationFallback;
pub use presence::tracker::PresenceTracker;
pub use server::{Collaborators, EngineSettings, RealtimeEngine};
