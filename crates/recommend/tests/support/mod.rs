//! Shared helpers для integration tests:
//! scripted product API whose responses can be held back until released.

#![allow(dead_code)]

use async_trait::async_trait;
use catalog::{CatalogError, CatalogResult, ListQuery, Product, ProductApi, ProductId};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tokio::sync::oneshot;

pub fn products(ids: &[&str]) -> Vec<Product> {
    ids.iter()
        .map(|id| Product::new(*id, format!("Product {id}")).with_price(10.0))
        .collect()
}

pub fn ids(products: &[Product]) -> Vec<String> {
    products.iter().map(|p| p.id.as_str().to_string()).collect()
}

struct Step {
    result: CatalogResult<Vec<Product>>,
    gate: Option<oneshot::Receiver<()>>,
}

/// Answers calls per endpoint in the order they were scripted.
///
/// Endpoints are `recommended`, `personalized` and `related:<id>`.
#[derive(Default)]
pub struct ScriptedApi {
    script: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, endpoint: &str, step: Step) {
        self.script
            .lock()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(step);
    }

    pub fn respond(&self, endpoint: &str, ids: &[&str]) {
        self.push(
            endpoint,
            Step {
                result: Ok(products(ids)),
                gate: None,
            },
        );
    }

    /// Response is held until the returned sender fires (or is dropped)
    pub fn respond_gated(&self, endpoint: &str, ids: &[&str]) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(
            endpoint,
            Step {
                result: Ok(products(ids)),
                gate: Some(rx),
            },
        );
        tx
    }

    pub fn fail(&self, endpoint: &str, error: CatalogError) {
        self.push(
            endpoint,
            Step {
                result: Err(error),
                gate: None,
            },
        );
    }

    /// Endpoints called so far with the requested limit
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().clone()
    }

    async fn answer(&self, endpoint: String, query: ListQuery) -> CatalogResult<Vec<Product>> {
        let step = self
            .script
            .lock()
            .get_mut(&endpoint)
            .and_then(|queue| queue.pop_front());
        self.calls.lock().push((endpoint.clone(), query.limit));

        let Some(step) = step else {
            return Err(CatalogError::Rejected {
                message: format!("unscripted call to {endpoint}"),
            });
        };
        if let Some(gate) = step.gate {
            let _ = gate.await;
        }
        step.result
    }
}

#[async_trait]
impl ProductApi for ScriptedApi {
    async fn recommended(&self, query: ListQuery) -> CatalogResult<Vec<Product>> {
        self.answer("recommended".to_string(), query).await
    }

    async fn personalized(&self, query: ListQuery) -> CatalogResult<Vec<Product>> {
        self.answer("personalized".to_string(), query).await
    }

    async fn related(&self, product_id: &ProductId, query: ListQuery) -> CatalogResult<Vec<Product>> {
        self.answer(format!("related:{product_id}"), query).await
    }
}
