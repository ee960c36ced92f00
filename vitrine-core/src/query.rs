//! Request identity and fetch status vocabulary shared with the cache layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProductId;

/// Identity of a cached request, distinguishing one result from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryKey {
    /// The full product list.
    Products,
    /// A single product by id.
    Product(ProductId),
    /// The distinct category labels.
    Categories,
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Products => write!(f, "products"),
            QueryKey::Product(id) => write!(f, "product/{id}"),
            QueryKey::Categories => write!(f, "categories"),
        }
    }
}

/// Fetch status of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FetchStatus {
    /// No fetch in flight and none withheld.
    #[default]
    Idle,
    /// A network request for this key is in flight.
    Fetching,
    /// A due fetch is withheld because the network is offline. Not an error:
    /// any cached value continues to be served.
    Paused,
    /// The most recent fetch failed.
    Error,
}
