//! Durable notification fallback for recipients who cannot be reached live.

pub mod fallback;
pub mod formatter;

pub use fallback::NotificationFallback;
