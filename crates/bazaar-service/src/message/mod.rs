//! Message store.

pub mod service;
pub mod validation;

pub use service::{MessageService, OutgoingMessage};
