//! Pagination query parameter extractor.

use serde::{Deserialize, Serialize};

use bazaar_core::config::ChatConfig;
use bazaar_core::types::pagination::PageRequest;

/// Query parameters for paginated endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaginationParams {
    /// Page number (1-based, default: 1).
    pub page: Option<u64>,
    /// Items per page (default and maximum from `chat` config).
    pub per_page: Option<u64>,
}

impl PaginationParams {
    /// Converts to a `PageRequest`, applying configured defaults and limits.
    pub fn into_page_request(self, chat: &ChatConfig) -> PageRequest {
        let per_page = self
            .per_page
            .unwrap_or(chat.default_page_size)
            .clamp(1, chat.max_page_size.max(1));
        PageRequest::new(self.page.unwrap_or(1).max(1), per_page)
    }
}
