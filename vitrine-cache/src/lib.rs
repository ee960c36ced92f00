//! Vitrine Cache - Query Cache & Synchronization Layer
//!
//! A keyed cache of asynchronous read results with per-subscription
//! staleness windows, de-duplication of concurrent identical requests,
//! explicit invalidation on writes, retention-based eviction, and
//! network-aware suspension of refetches.
//!
//! # Design Philosophy
//!
//! Staleness is explicit: every subscription states its tolerance via
//! [`QueryOptions`], and reads return [`QuerySnapshot`] which carries the
//! fetch status alongside the value. An offline network does not turn into
//! errors; due fetches are withheld in [`FetchStatus::Paused`] and the
//! last-known value keeps being served.

pub mod entry;
pub mod fetcher;
pub mod network;
pub mod observer;
pub mod staleness;
pub mod store;

pub use entry::QuerySnapshot;
pub use fetcher::QueryFetcher;
pub use network::{NetworkMonitor, NetworkSubscription};
pub use observer::QueryObserver;
pub use staleness::QueryOptions;
pub use store::{QueryCache, QueryEvent};

pub use vitrine_core::FetchStatus;
