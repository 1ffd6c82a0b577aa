//! # bazaar-database
//!
//! Repository traits for conversations and messages, their PostgreSQL
//! implementations, and the database connection and migration helpers.
//!
//! With the `memory` feature (on by default) the crate also ships an
//! in-process store implementing the same traits, used for single-node
//! runs and tests.

pub mod connection;
#[cfg(feature = "memory")]
pub mod memory;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{ConversationRepository, MessageRepository};
