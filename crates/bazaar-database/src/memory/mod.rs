//! In-process implementations of the repository and collaborator traits.
//!
//! Suitable for single-node deployments and tests. Nothing survives a restart.

pub mod notification;
pub mod product;
pub mod store;

pub use notification::MemoryNotificationSink;
pub use product::MemoryProductCatalog;
pub use store::MemoryStore;
