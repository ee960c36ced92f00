//! Supplier trait connecting the cache to the remote catalog client.

use async_trait::async_trait;
use serde_json::Value;
use vitrine_core::CatalogResult;

/// Supplier of a cache key's value.
///
/// Implementations wrap one remote catalog operation. The cache calls
/// `fetch` only when a value is needed (missing, stale, or invalidated) and
/// never retries a failure on its own.
///
/// Values cross this boundary as [`serde_json::Value`] so heterogeneous
/// results can share one store; typed access happens on read.
#[async_trait]
pub trait QueryFetcher: Send + Sync {
    /// Issue the network request that supplies this key's value.
    async fn fetch(&self) -> CatalogResult<Value>;
}
