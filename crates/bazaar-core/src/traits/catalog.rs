//! Product catalog lookups.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::id::ProductId;

/// Compact product summary attached to chat payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnippet {
    /// The product.
    pub product_id: ProductId,
    /// Listing title.
    pub title: String,
    /// First listing image, if any.
    pub image_url: Option<String>,
}

/// Resolves product snippets by id.
#[async_trait]
pub trait ProductCatalog: Send + Sync + std::fmt::Debug + 'static {
    /// Look up the snippet for a product. Returns `None` if the product is unknown.
    async fn snippet(&self, product_id: ProductId) -> AppResult<Option<ProductSnippet>>;
}
