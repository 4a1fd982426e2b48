use super::ProductApi;
use crate::product::{ApiEnvelope, ListQuery, Product, ProductId};
use async_trait::async_trait;
use common::{ApiConfig, CatalogError, CatalogResult, NetworkError};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

/// `reqwest` client for the storefront REST API
#[derive(Debug, Clone)]
pub struct HttpProductApi {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl HttpProductApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CatalogResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NetworkError::Request(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            timeout,
        })
    }

    pub fn from_config(config: &ApiConfig) -> CatalogResult<Self> {
        let api = Self::new(config.base_url.clone(), config.timeout())?;
        Ok(match &config.token {
            Some(token) => api.with_token(token.clone()),
            None => api,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_products(&self, path: &str, query: ListQuery) -> CatalogResult<Vec<Product>> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} limit={}", url, query.limit);

        let mut request = self.client.get(&url).query(&query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(CatalogError::Unauthenticated);
        }

        if !status.is_success() {
            let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
                .map(|envelope| envelope.failure_message())
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string()
                });
            return Err(NetworkError::Http {
                code: status.as_u16(),
                message,
            }
            .into());
        }

        let envelope: ApiEnvelope<Vec<Product>> =
            serde_json::from_str(&body).map_err(|e| CatalogError::Decode(e.to_string()))?;
        let products = envelope.into_result()?;

        debug!("✅ {} returned {} products", path, products.len());
        Ok(products)
    }

    fn transport_error(&self, error: reqwest::Error) -> CatalogError {
        let network = if error.is_timeout() {
            NetworkError::Timeout(self.timeout.as_millis() as u64)
        } else if error.is_connect() {
            NetworkError::ConnectionFailed(error.to_string())
        } else if error.is_decode() {
            return CatalogError::Decode(error.to_string());
        } else {
            NetworkError::Request(error.to_string())
        };
        network.into()
    }
}

#[async_trait]
impl ProductApi for HttpProductApi {
    async fn recommended(&self, query: ListQuery) -> CatalogResult<Vec<Product>> {
        self.get_products("/products/recommendations", query).await
    }

    async fn personalized(&self, query: ListQuery) -> CatalogResult<Vec<Product>> {
        if self.token.is_none() {
            info!("Personalized recommendations requested without a token");
            return Err(CatalogError::Unauthenticated);
        }
        self.get_products("/products/recommendations/personalized", query)
            .await
    }

    async fn related(
        &self,
        product_id: &ProductId,
        query: ListQuery,
    ) -> CatalogResult<Vec<Product>> {
        if !product_id.is_path_safe() {
            return Err(CatalogError::InvalidProductId(product_id.to_string()));
        }
        self.get_products(&format!("/products/{product_id}/related"), query)
            .await
    }

    fn name(&self) -> String {
        format!("http ({})", self.base_url)
    }
}
