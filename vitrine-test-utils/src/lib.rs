//! Vitrine Test Utilities
//!
//! Centralized test infrastructure for the workspace:
//! - Fixtures for products and create requests
//! - Proptest generators for catalog entities
//! - Scripted cache suppliers for exercising the synchronization layer

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use proptest::prelude::*;
use serde_json::Value;

// Re-export core types for convenience
pub use vitrine_core::{
    category_frequencies, popular_categories, CacheError, CatalogError, CatalogResult,
    ClientError, CreateProductRequest, CreateProductResponse, FetchStatus, Product, ProductId,
    QueryKey, Rating, ValidationError,
};

use vitrine_cache::QueryFetcher;

// ============================================================================
// FIXTURES
// ============================================================================

/// A product with the given id and category and placeholder content.
pub fn product(id: ProductId, category: &str) -> Product {
    Product {
        id,
        title: format!("Product {id}"),
        price: 9.99,
        description: "fixture".to_string(),
        category: category.to_string(),
        image: format!("https://img.example.com/{id}.png"),
        rating: Rating {
            rate: 4.1,
            count: 12,
        },
    }
}

/// One product per label, ids assigned in order starting at 1.
pub fn products_by_category(labels: &[&str]) -> Vec<Product> {
    labels
        .iter()
        .enumerate()
        .map(|(index, label)| product(index as ProductId + 1, label))
        .collect()
}

/// A create request that passes validation.
pub fn create_request() -> CreateProductRequest {
    CreateProductRequest {
        title: "New product".to_string(),
        price: 19.99,
        description: "fixture".to_string(),
        category: "misc".to_string(),
        image: "https://img.example.com/new.png".to_string(),
    }
}

// ============================================================================
// SCRIPTED SUPPLIERS
// ============================================================================

/// Supplier that returns a fixed value and counts its invocations,
/// optionally sleeping first to keep a request observably in flight.
pub struct CountingFetcher {
    value: Value,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl CountingFetcher {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn products(products: Vec<Product>) -> Self {
        Self::new(serde_json::to_value(products).expect("products serialize"))
    }

    pub fn categories(labels: Vec<String>) -> Self {
        Self::new(serde_json::to_value(labels).expect("labels serialize"))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryFetcher for CountingFetcher {
    async fn fetch(&self) -> CatalogResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.value.clone())
    }
}

/// Supplier that always fails with the given HTTP status.
pub struct FailingFetcher {
    endpoint: String,
    status: u16,
    calls: AtomicUsize,
}

impl FailingFetcher {
    pub fn new(endpoint: impl Into<String>, status: u16) -> Self {
        Self {
            endpoint: endpoint.into(),
            status,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryFetcher for FailingFetcher {
    async fn fetch(&self) -> CatalogResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ClientError::RequestFailed {
            endpoint: self.endpoint.clone(),
            status: Some(self.status),
            reason: format!("status {}", self.status),
        }
        .into())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub fn arb_rating() -> impl Strategy<Value = Rating> {
    (0.0..=5.0f64, 0u32..10_000).prop_map(|(rate, count)| Rating { rate, count })
}

pub fn arb_product() -> impl Strategy<Value = Product> {
    (
        1u32..100_000,
        "[A-Za-z ]{1,24}",
        0.01..10_000.0f64,
        "[a-z ]{0,40}",
        "[a-z' ]{0,12}",
        arb_rating(),
    )
        .prop_map(|(id, title, price, description, category, rating)| Product {
            id,
            title,
            price,
            description,
            category,
            image: format!("https://img.example.com/{id}.png"),
            rating,
        })
}

pub fn arb_products(max: usize) -> impl Strategy<Value = Vec<Product>> {
    proptest::collection::vec(arb_product(), 0..max)
}
