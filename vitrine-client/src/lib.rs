//! Vitrine Client - Remote Catalog Client & Application Root
//!
//! Issues read/write calls to the remote catalog over HTTP and wires them
//! into the cache layer: one fetcher per read operation, a TOML
//! configuration, and the [`CatalogContext`] owning client, cache, and
//! network monitor for the lifetime of the application.

pub mod client;
pub mod config;
pub mod context;
pub mod fetchers;

pub use client::CatalogClient;
pub use config::{CatalogConfig, ConfigError, StalenessConfig};
pub use context::CatalogContext;
pub use fetchers::{CategoriesFetcher, ProductFetcher, ProductsFetcher};
