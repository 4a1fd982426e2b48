use common::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Stable product identifier, the deduplication key across sections
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse an id that will be used as a URL path segment
    pub fn parse(raw: &str) -> CatalogResult<Self> {
        let id = Self(raw.trim().to_string());
        if id.is_path_safe() {
            Ok(id)
        } else {
            Err(CatalogError::InvalidProductId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Product as returned by the recommendation endpoints.
///
/// Only `id` takes part in arbitration; everything else is carried for
/// presentation. Fields this type doesn't name end up in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(default)]
    pub name: String,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub image: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub sales: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: None,
            original_price: None,
            image: None,
            rating: None,
            review_count: None,
            sales: None,
            extra: Map::new(),
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }
}

/// Query parameters shared by the list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    pub limit: usize,
}

impl ListQuery {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

/// `{ success, data, error?, message? }` wrapper used by every endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl<T: Default> ApiEnvelope<T> {
    /// A successful envelope without `data` counts as an empty payload
    pub fn into_result(self) -> CatalogResult<T> {
        if self.success {
            Ok(self.data.unwrap_or_default())
        } else {
            Err(CatalogError::Rejected {
                message: self.failure_message(),
            })
        }
    }
}

impl<T> ApiEnvelope<T> {
    pub fn failure_message(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "request was not successful".to_string())
    }
}
