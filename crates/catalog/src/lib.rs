//! Product fetch boundary for the storefront backend.
//!
//! Recommendation sections only ever see the backend through [`ProductApi`]:
//! three ranked-list queries (recommended, personalized, related) that all
//! answer with the same `{ success, data }` envelope.

pub mod product;
pub mod providers;

pub use product::{ApiEnvelope, ListQuery, Product, ProductId};
pub use providers::{HttpProductApi, ProductApi};

#[cfg(any(test, feature = "test-utils"))]
pub use providers::MockProductApi;

pub use common::{CatalogError, CatalogResult, NetworkError};
