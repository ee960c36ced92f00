//! Per-subscription cache policy.

use std::time::Duration;

/// Policy a subscription attaches to its cache key.
///
/// `stale_time` is the age beyond which a cached value triggers a refetch;
/// a zero window means every fresh subscription refetches. `retention` is
/// how long an entry with no subscribers survives before eviction; zero
/// means the entry dies with its last subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub stale_time: Duration,
    pub retention: Duration,
    /// Disabled subscriptions never trigger a fetch regardless of staleness.
    pub enabled: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            retention: Duration::from_secs(300),
            enabled: true,
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
