//! Application root owning client, cache, and network monitor.
//!
//! The context is explicit and injectable: created at startup, passed to
//! every component that needs catalog or cache access, torn down at
//! shutdown. There are no process-wide singletons.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use vitrine_cache::{
    NetworkMonitor, QueryCache, QueryObserver, QueryOptions, QuerySnapshot,
};
use vitrine_core::{
    popular_categories, CatalogResult, ClientError, CreateProductRequest, CreateProductResponse,
    Product, ProductId, QueryKey,
};

use crate::client::CatalogClient;
use crate::config::CatalogConfig;
use crate::fetchers::{CategoriesFetcher, ProductFetcher, ProductsFetcher};

/// The application root.
///
/// Entry points mirror what the view layer consumes: a product-list
/// subscription for the sidebar, a single-product subscription for the
/// detail panel, a deferrable categories subscription for the create form,
/// the popularity ranking derived from the product-list entry, and the
/// create operation that invalidates the list on success.
pub struct CatalogContext {
    config: CatalogConfig,
    client: CatalogClient,
    cache: QueryCache,
}

impl CatalogContext {
    /// Build the context from a validated configuration and the
    /// environment-seeded network monitor.
    pub fn new(config: CatalogConfig, network: NetworkMonitor) -> Result<Self, ClientError> {
        let client = CatalogClient::new(&config)?;
        let cache = QueryCache::new(network);
        Ok(Self {
            config,
            client,
            cache,
        })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn network(&self) -> &NetworkMonitor {
        self.cache.network()
    }

    /// The list is refetched on every fresh subscription and dies with its
    /// last subscriber.
    fn products_options(&self) -> QueryOptions {
        QueryOptions::new()
            .with_stale_time(Duration::from_millis(self.config.staleness.products_ms))
            .with_retention(Duration::ZERO)
    }

    fn product_options(&self, id: ProductId) -> QueryOptions {
        QueryOptions::new()
            .with_stale_time(Duration::from_millis(self.config.staleness.product_ms))
            .with_retention(Duration::from_millis(self.config.retention_ms))
            // Keeps `GET /products/0` from ever being issued.
            .with_enabled(id != 0)
    }

    fn categories_options(&self, enabled: bool) -> QueryOptions {
        QueryOptions::new()
            .with_stale_time(Duration::from_millis(self.config.staleness.categories_ms))
            .with_retention(Duration::from_millis(self.config.retention_ms))
            .with_enabled(enabled)
    }

    /// Subscribe to the full product list.
    pub fn products(
        &self,
        on_change: impl Fn(QuerySnapshot<Vec<Product>>) + Send + Sync + 'static,
    ) -> QueryObserver<Vec<Product>> {
        QueryObserver::new(
            &self.cache,
            QueryKey::Products,
            self.products_options(),
            Arc::new(ProductsFetcher::new(self.client.clone())),
            on_change,
        )
    }

    /// Subscribe to a single product. With id 0 ("nothing selected") the
    /// subscription stays disabled and never fetches.
    pub fn product(
        &self,
        id: ProductId,
        on_change: impl Fn(QuerySnapshot<Product>) + Send + Sync + 'static,
    ) -> QueryObserver<Product> {
        QueryObserver::new(
            &self.cache,
            QueryKey::Product(id),
            self.product_options(id),
            Arc::new(ProductFetcher::new(self.client.clone(), id)),
            on_change,
        )
    }

    /// Subscribe to the category labels. Pass `enabled = false` to defer
    /// the fetch until the consumer actually needs them (the create form
    /// does this until it is opened).
    pub fn categories(
        &self,
        enabled: bool,
        on_change: impl Fn(QuerySnapshot<Vec<String>>) + Send + Sync + 'static,
    ) -> QueryObserver<Vec<String>> {
        QueryObserver::new(
            &self.cache,
            QueryKey::Categories,
            self.categories_options(enabled),
            Arc::new(CategoriesFetcher::new(self.client.clone())),
            on_change,
        )
    }

    /// Subscribe to the popularity ranking derived from the product-list
    /// entry. Deliveries carry the ranked labels; the returned observer's
    /// own snapshot is the underlying product list.
    pub fn popular_categories(
        &self,
        on_change: impl Fn(QuerySnapshot<Vec<String>>) + Send + Sync + 'static,
    ) -> QueryObserver<Vec<Product>> {
        self.products(move |snapshot| {
            on_change(snapshot.map(|products| popular_categories(&products)))
        })
    }

    /// Validate and submit a new product.
    ///
    /// On success the product-list key is invalidated so the next natural
    /// refetch opportunity picks the record up; the server echo is never
    /// merged into a cached list. On failure nothing in the cache changes
    /// and the borrowed request leaves the caller's form state intact.
    pub async fn create_product(
        &self,
        request: &CreateProductRequest,
    ) -> CatalogResult<CreateProductResponse> {
        request.validate()?;
        let created = self.client.create_product(request).await?;
        tracing::info!(id = created.id, "product created");
        self.cache.invalidate(QueryKey::Products);
        Ok(created)
    }

    /// Start the periodic eviction pass. Abort the handle to stop it.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        self.cache
            .spawn_sweeper(Duration::from_millis(self.config.sweep_interval_ms))
    }
}
