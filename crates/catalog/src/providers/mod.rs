use crate::product::{ListQuery, Product, ProductId};
use async_trait::async_trait;
use common::CatalogResult;

pub mod http_provider;

pub use http_provider::HttpProductApi;

/// Ranked candidate lists served by the storefront backend
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ProductApi: Send + Sync {
    /// Non-personalized "recommended products" list
    async fn recommended(&self, query: ListQuery) -> CatalogResult<Vec<Product>>;

    /// Personalized list for the signed-in viewer
    async fn personalized(&self, query: ListQuery) -> CatalogResult<Vec<Product>>;

    /// Products related to `product_id`
    async fn related(&self, product_id: &ProductId, query: ListQuery)
        -> CatalogResult<Vec<Product>>;

    /// Human-readable name for logs
    fn name(&self) -> String {
        "product-api".to_string()
    }
}
