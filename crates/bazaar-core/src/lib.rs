//! # bazaar-core
//!
//! Core crate for Bazaar Messenger. Contains configuration schemas,
//! typed identifiers, pagination types, the contracts of the external
//! collaborators (identity, product catalog, notifications), and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other Bazaar crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
