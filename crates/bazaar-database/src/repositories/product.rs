//! PostgreSQL product catalog lookups.

use async_trait::async_trait;
use sqlx::PgPool;

use bazaar_core::error::{AppError, ErrorKind};
use bazaar_core::result::AppResult;
use bazaar_core::traits::catalog::{ProductCatalog, ProductSnippet};
use bazaar_core::types::id::ProductId;

/// Reads product snippets from the catalog's `products` table.
#[derive(Debug, Clone)]
pub struct PgProductCatalog {
    pool: PgPool,
}

impl PgProductCatalog {
    /// Create a new catalog reader.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductCatalog for PgProductCatalog {
    async fn snippet(&self, product_id: ProductId) -> AppResult<Option<ProductSnippet>> {
        let row: Option<(ProductId, String, Option<String>)> =
            sqlx::query_as("SELECT id, title, images[1] FROM products WHERE id = $1")
                .bind(product_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::ExternalService, "Failed to load product", e)
                })?;

        Ok(row.map(|(product_id, title, image_url)| ProductSnippet {
            product_id,
            title,
            image_url,
        }))
    }
}
