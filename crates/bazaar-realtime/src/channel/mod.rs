//! Channels a connection can listen on: private user inboxes, global
//! presence, and per-conversation typing topics.

pub mod registry;
pub mod subscription;
pub mod types;

pub use registry::ChannelRegistry;
pub use types::ChannelType;
