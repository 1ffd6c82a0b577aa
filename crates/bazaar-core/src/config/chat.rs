//! Chat and notification fallback configuration.

use serde::{Deserialize, Serialize};

/// Message and conversation listing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Maximum message length in characters.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
    /// Page size used when a request does not specify one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    /// Upper bound for a requested page size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_content_length: default_max_content_length(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

/// Offline notification fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Characters of message content kept in the notification preview.
    #[serde(default = "default_preview_length")]
    pub preview_length: usize,
    /// Upper bound on a single notification write, in milliseconds.
    #[serde(default = "default_fallback_timeout")]
    pub fallback_timeout_ms: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            preview_length: default_preview_length(),
            fallback_timeout_ms: default_fallback_timeout(),
        }
    }
}

fn default_max_content_length() -> usize {
    4000
}

fn default_page_size() -> u64 {
    50
}

fn default_max_page_size() -> u64 {
    100
}

fn default_preview_length() -> usize {
    100
}

fn default_fallback_timeout() -> u64 {
    2000
}
