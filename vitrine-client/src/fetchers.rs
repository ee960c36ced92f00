//! Cache suppliers wrapping each catalog read operation.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use vitrine_cache::QueryFetcher;
use vitrine_core::{CacheError, CatalogResult, ProductId, QueryKey};

use crate::client::CatalogClient;

fn encode<T: Serialize>(key: QueryKey, value: &T) -> CatalogResult<Value> {
    serde_json::to_value(value).map_err(|err| {
        CacheError::Encode {
            key,
            reason: err.to_string(),
        }
        .into()
    })
}

/// Supplier for the product-list key.
pub struct ProductsFetcher {
    client: CatalogClient,
}

impl ProductsFetcher {
    pub fn new(client: CatalogClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueryFetcher for ProductsFetcher {
    async fn fetch(&self) -> CatalogResult<Value> {
        let products = self.client.list_products().await?;
        encode(QueryKey::Products, &products)
    }
}

/// Supplier for a single-product key.
pub struct ProductFetcher {
    client: CatalogClient,
    id: ProductId,
}

impl ProductFetcher {
    pub fn new(client: CatalogClient, id: ProductId) -> Self {
        Self { client, id }
    }
}

#[async_trait]
impl QueryFetcher for ProductFetcher {
    async fn fetch(&self) -> CatalogResult<Value> {
        let product = self.client.get_product(self.id).await?;
        encode(QueryKey::Product(self.id), &product)
    }
}

/// Supplier for the categories key.
pub struct CategoriesFetcher {
    client: CatalogClient,
}

impl CategoriesFetcher {
    pub fn new(client: CatalogClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueryFetcher for CategoriesFetcher {
    async fn fetch(&self) -> CatalogResult<Value> {
        let categories = self.client.list_categories().await?;
        encode(QueryKey::Categories, &categories)
    }
}
