//! # bazaar-service
//!
//! Business logic for conversations and messages. Each service wraps a
//! repository trait object and enforces the participant gate before any
//! read or write.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod conversation;
pub mod message;

pub use conversation::ConversationService;
pub use message::{MessageService, OutgoingMessage};
