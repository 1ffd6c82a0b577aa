//! Contracts of the external collaborators consumed by the chat core.
//!
//! Accounts, the product catalog and the notification inbox are owned by
//! other services. The chat core only talks to them through these traits.

pub mod catalog;
pub mod identity;
pub mod notify;

pub use catalog::{ProductCatalog, ProductSnippet};
pub use identity::{Identity, IdentityResolver};
pub use notify::{NewNotification, NotificationSink};
