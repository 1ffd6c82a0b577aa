//! Fixed product catalog.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use bazaar_core::error::AppError;
use bazaar_core::result::AppResult;
use bazaar_core::traits::catalog::{ProductCatalog, ProductSnippet};
use bazaar_core::types::id::ProductId;

/// Serves snippets registered up front.
#[derive(Debug, Clone, Default)]
pub struct MemoryProductCatalog {
    products: Arc<DashMap<ProductId, ProductSnippet>>,
    failing: Arc<AtomicBool>,
}

impl MemoryProductCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a product.
    pub fn insert(&self, snippet: ProductSnippet) {
        self.products.insert(snippet.product_id, snippet);
    }

    /// Make every subsequent lookup fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProductCatalog for MemoryProductCatalog {
    async fn snippet(&self, product_id: ProductId) -> AppResult<Option<ProductSnippet>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::external("Product catalog unavailable"));
        }
        Ok(self.products.get(&product_id).map(|s| s.value().clone()))
    }
}
