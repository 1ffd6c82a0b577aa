//! Conversation directory.

pub mod service;

pub use service::ConversationService;
