//! Cache entry state and the snapshot delivered to subscribers.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;
use vitrine_core::{CacheError, CatalogError, FetchStatus, QueryKey};

/// Point-in-time view of a cache entry.
///
/// Carries the best-known value together with the status flags a consumer
/// needs to render it: whether a request is in flight, whether the fetch is
/// withheld offline, and the last error if one occurred.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
    pub value: Option<T>,
    pub status: FetchStatus,
    pub error: Option<CatalogError>,
    pub updated_at: Option<Instant>,
}

impl<T> QuerySnapshot<T> {
    /// Snapshot of a key that has never been fetched.
    pub fn empty() -> Self {
        Self {
            value: None,
            status: FetchStatus::Idle,
            error: None,
            updated_at: None,
        }
    }

    /// True until a first value arrives while a fetch is underway or
    /// withheld offline.
    pub fn is_loading(&self) -> bool {
        self.value.is_none()
            && matches!(self.status, FetchStatus::Fetching | FetchStatus::Paused)
    }

    /// True whenever a request for this key is in flight, even if a stale
    /// value is being served meanwhile.
    pub fn is_fetching(&self) -> bool {
        self.status == FetchStatus::Fetching
    }

    /// Map the inner value to a new type, keeping the status metadata.
    pub fn map<U, F>(self, f: F) -> QuerySnapshot<U>
    where
        F: FnOnce(T) -> U,
    {
        QuerySnapshot {
            value: self.value.map(f),
            status: self.status,
            error: self.error,
            updated_at: self.updated_at,
        }
    }
}

impl QuerySnapshot<Value> {
    /// Decode the raw cached value into the subscriber's type.
    ///
    /// A value that no longer matches the expected shape surfaces as a
    /// per-key error status rather than a panic.
    pub fn decode<T: DeserializeOwned>(self, key: QueryKey) -> QuerySnapshot<T> {
        match self.value {
            None => QuerySnapshot {
                value: None,
                status: self.status,
                error: self.error,
                updated_at: self.updated_at,
            },
            Some(raw) => match serde_json::from_value(raw) {
                Ok(value) => QuerySnapshot {
                    value: Some(value),
                    status: self.status,
                    error: self.error,
                    updated_at: self.updated_at,
                },
                Err(err) => QuerySnapshot {
                    value: None,
                    status: FetchStatus::Error,
                    error: Some(
                        CacheError::Decode {
                            key,
                            reason: err.to_string(),
                        }
                        .into(),
                    ),
                    updated_at: self.updated_at,
                },
            },
        }
    }
}

/// Internal per-key state.
#[derive(Debug)]
pub(crate) struct EntryState {
    pub(crate) value: Option<Value>,
    pub(crate) status: FetchStatus,
    pub(crate) error: Option<CatalogError>,
    pub(crate) updated_at: Option<Instant>,
    /// Set by an explicit invalidation; overrides any staleness window.
    pub(crate) invalidated: bool,
    pub(crate) subscribers: usize,
    pub(crate) retention: Duration,
    /// When the last subscriber detached; drives retention-based eviction.
    pub(crate) released_at: Option<Instant>,
}

impl EntryState {
    pub(crate) fn new(retention: Duration) -> Self {
        Self {
            value: None,
            status: FetchStatus::Idle,
            error: None,
            updated_at: None,
            invalidated: false,
            subscribers: 0,
            retention,
            released_at: Some(Instant::now()),
        }
    }

    /// A value is fresh while it is younger than the staleness window and
    /// has not been explicitly invalidated.
    pub(crate) fn is_fresh(&self, stale_time: Duration) -> bool {
        if self.invalidated {
            return false;
        }
        match self.updated_at {
            Some(at) => at.elapsed() < stale_time,
            None => false,
        }
    }

    pub(crate) fn snapshot(&self) -> QuerySnapshot<Value> {
        QuerySnapshot {
            value: self.value.clone(),
            status: self.status,
            error: self.error.clone(),
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_snapshot_is_not_loading_until_a_fetch_starts() {
        let snapshot: QuerySnapshot<Value> = QuerySnapshot::empty();
        assert!(!snapshot.is_loading());
        assert!(!snapshot.is_fetching());
    }

    #[test]
    fn loading_requires_absent_value() {
        let fetching_without_value = QuerySnapshot::<Value> {
            value: None,
            status: FetchStatus::Fetching,
            error: None,
            updated_at: None,
        };
        assert!(fetching_without_value.is_loading());

        let fetching_with_value = QuerySnapshot {
            value: Some(json!([1, 2, 3])),
            status: FetchStatus::Fetching,
            error: None,
            updated_at: None,
        };
        assert!(!fetching_with_value.is_loading());
        assert!(fetching_with_value.is_fetching());
    }

    #[test]
    fn paused_without_value_reads_as_loading() {
        let snapshot = QuerySnapshot::<Value> {
            value: None,
            status: FetchStatus::Paused,
            error: None,
            updated_at: None,
        };
        assert!(snapshot.is_loading());
    }

    #[test]
    fn decode_mismatch_surfaces_as_error_status() {
        let snapshot = QuerySnapshot {
            value: Some(json!({"not": "a list"})),
            status: FetchStatus::Idle,
            error: None,
            updated_at: None,
        };
        let decoded = snapshot.decode::<Vec<String>>(QueryKey::Categories);
        assert!(decoded.value.is_none());
        assert_eq!(decoded.status, FetchStatus::Error);
        assert!(matches!(
            decoded.error,
            Some(CatalogError::Cache(CacheError::Decode { .. }))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn freshness_follows_the_staleness_window() {
        let mut entry = EntryState::new(Duration::from_secs(300));
        entry.value = Some(json!([]));
        entry.updated_at = Some(Instant::now());

        assert!(entry.is_fresh(Duration::from_secs(60)));
        // A zero window means nothing is ever fresh.
        assert!(!entry.is_fresh(Duration::ZERO));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!entry.is_fresh(Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_overrides_freshness() {
        let mut entry = EntryState::new(Duration::from_secs(300));
        entry.value = Some(json!([]));
        entry.updated_at = Some(Instant::now());
        entry.invalidated = true;

        assert!(!entry.is_fresh(Duration::from_secs(3600)));
    }
}
