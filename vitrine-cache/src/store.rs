//! The keyed query cache.
//!
//! Routes reads based on per-subscription staleness windows, collapses
//! concurrent requests for the same key into one network call, and holds
//! due fetches in a paused state while the network is offline.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use vitrine_core::{FetchStatus, QueryKey};

use crate::entry::{EntryState, QuerySnapshot};
use crate::fetcher::QueryFetcher;
use crate::network::{NetworkMonitor, NetworkSubscription};
use crate::staleness::QueryOptions;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// State-transition notification for cache subscribers.
#[derive(Debug, Clone)]
pub enum QueryEvent {
    /// The entry's state changed: a fetch started, completed, failed, or
    /// was paused.
    Updated { key: QueryKey },
    /// A write marked the entry stale; active observers should refetch.
    Invalidated { key: QueryKey },
    /// Connectivity returned; paused entries may resume.
    NetworkResumed,
}

#[derive(Default)]
struct StoreState {
    entries: HashMap<QueryKey, EntryState>,
    /// One in-flight request per key at most; waiters share the receiver.
    in_flight: HashMap<QueryKey, watch::Receiver<bool>>,
}

struct CacheShared {
    state: Mutex<StoreState>,
    events: broadcast::Sender<QueryEvent>,
    network: NetworkMonitor,
    _network_subscription: NetworkSubscription,
}

impl CacheShared {
    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        // A poisoned lock only means a fetch task panicked mid-update; the
        // entry map itself is still coherent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keyed cache of asynchronous read results.
///
/// Cheap to clone; clones share the same entries, in-flight map, and event
/// channel. Failure semantics are per key: an error on one key never
/// touches another key's entry.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheShared>,
}

enum Plan {
    Serve(QuerySnapshot<Value>),
    Wait(watch::Receiver<bool>),
}

impl QueryCache {
    pub fn new(network: NetworkMonitor) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let resume_events = events.clone();
        let subscription = network.subscribe(move |online| {
            if online {
                let _ = resume_events.send(QueryEvent::NetworkResumed);
            }
        });
        Self {
            inner: Arc::new(CacheShared {
                state: Mutex::new(StoreState::default()),
                events,
                network,
                _network_subscription: subscription,
            }),
        }
    }

    pub fn network(&self) -> &NetworkMonitor {
        &self.inner.network
    }

    /// Receive state-transition events for all keys.
    pub fn subscribe_events(&self) -> broadcast::Receiver<QueryEvent> {
        self.inner.events.subscribe()
    }

    /// Read the current state of a key without triggering anything.
    pub fn peek(&self, key: QueryKey) -> Option<QuerySnapshot<Value>> {
        self.inner
            .lock_state()
            .entries
            .get(&key)
            .map(EntryState::snapshot)
    }

    /// Read path: serve a fresh value without a network call, otherwise
    /// refetch while continuing to serve any stale value to onlookers.
    ///
    /// Disabled subscriptions never fetch. While offline, a due fetch is
    /// withheld in [`FetchStatus::Paused`] instead of being attempted.
    pub async fn fetch(
        &self,
        key: QueryKey,
        options: &QueryOptions,
        fetcher: &Arc<dyn QueryFetcher>,
    ) -> QuerySnapshot<Value> {
        self.fetch_inner(key, options, fetcher, false).await
    }

    /// Forced variant of [`QueryCache::fetch`] for manual refresh: ignores
    /// freshness but still honors `enabled` and offline suspension.
    pub async fn refetch(
        &self,
        key: QueryKey,
        options: &QueryOptions,
        fetcher: &Arc<dyn QueryFetcher>,
    ) -> QuerySnapshot<Value> {
        self.fetch_inner(key, options, fetcher, true).await
    }

    async fn fetch_inner(
        &self,
        key: QueryKey,
        options: &QueryOptions,
        fetcher: &Arc<dyn QueryFetcher>,
        force: bool,
    ) -> QuerySnapshot<Value> {
        if !options.enabled {
            return self.peek(key).unwrap_or_else(QuerySnapshot::empty);
        }

        let plan = {
            let mut state = self.inner.lock_state();
            let online = self.inner.network.is_online();
            let StoreState { entries, in_flight } = &mut *state;
            let entry = entries
                .entry(key)
                .or_insert_with(|| EntryState::new(options.retention));
            entry.retention = options.retention;

            if let Some(done) = in_flight.get(&key) {
                // Attach to the request already in flight.
                Plan::Wait(done.clone())
            } else if !force && entry.is_fresh(options.stale_time) {
                Plan::Serve(entry.snapshot())
            } else if !online {
                if entry.status != FetchStatus::Paused {
                    entry.status = FetchStatus::Paused;
                    tracing::debug!(%key, "fetch paused while offline");
                    let _ = self.inner.events.send(QueryEvent::Updated { key });
                }
                Plan::Serve(entry.snapshot())
            } else {
                let (done_tx, done_rx) = watch::channel(false);
                in_flight.insert(key, done_rx.clone());
                entry.status = FetchStatus::Fetching;
                entry.error = None;
                tracing::debug!(%key, "fetch started");
                let _ = self.inner.events.send(QueryEvent::Updated { key });
                self.spawn_fetch(key, Arc::clone(fetcher), done_tx);
                Plan::Wait(done_rx)
            }
        };

        match plan {
            Plan::Serve(snapshot) => snapshot,
            Plan::Wait(mut done) => {
                if !*done.borrow() {
                    // An Err means the fetch task dropped the sender, which
                    // also signals completion.
                    let _ = done.changed().await;
                }
                self.peek(key).unwrap_or_else(QuerySnapshot::empty)
            }
        }
    }

    /// The fetch runs as its own task so that a subscriber cancelling
    /// mid-flight never cancels the request for everyone else.
    fn spawn_fetch(
        &self,
        key: QueryKey,
        fetcher: Arc<dyn QueryFetcher>,
        done: watch::Sender<bool>,
    ) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = fetcher.fetch().await;
            {
                let mut state = inner.lock_state();
                state.in_flight.remove(&key);
                // A missing entry means every subscriber detached and the
                // entry was evicted while the request was in flight; the
                // result is discarded.
                if let Some(entry) = state.entries.get_mut(&key) {
                    match result {
                        Ok(value) => {
                            tracing::debug!(%key, "fetch completed");
                            entry.value = Some(value);
                            entry.updated_at = Some(Instant::now());
                            entry.status = FetchStatus::Idle;
                            entry.error = None;
                            entry.invalidated = false;
                        }
                        Err(err) => {
                            // Zero automatic retries: the error becomes the
                            // key's status; any stale value is kept.
                            tracing::warn!(%key, error = %err, "fetch failed");
                            entry.status = FetchStatus::Error;
                            entry.error = Some(err);
                        }
                    }
                    // With zero retention and no remaining subscribers the
                    // result has nobody left to serve; discard it.
                    let discard = entry.subscribers == 0 && entry.retention.is_zero();
                    if discard {
                        state.entries.remove(&key);
                        tracing::debug!(%key, "evicted");
                    }
                }
            }
            let _ = inner.events.send(QueryEvent::Updated { key });
            let _ = done.send(true);
        });
    }

    /// Mark a key stale immediately, independent of its staleness window.
    ///
    /// Active observers refetch on the broadcast event. While offline the
    /// entry moves to [`FetchStatus::Paused`] and keeps its cached value.
    pub fn invalidate(&self, key: QueryKey) {
        {
            let mut state = self.inner.lock_state();
            let online = self.inner.network.is_online();
            if let Some(entry) = state.entries.get_mut(&key) {
                entry.invalidated = true;
                if !online && entry.status != FetchStatus::Fetching {
                    entry.status = FetchStatus::Paused;
                }
            }
        }
        tracing::debug!(%key, "invalidated");
        let _ = self.inner.events.send(QueryEvent::Invalidated { key });
    }

    /// Register a live subscriber for a key.
    pub(crate) fn acquire(&self, key: QueryKey, retention: Duration) {
        let mut state = self.inner.lock_state();
        let entry = state
            .entries
            .entry(key)
            .or_insert_with(|| EntryState::new(retention));
        entry.retention = retention;
        entry.subscribers += 1;
        entry.released_at = None;
    }

    /// Detach a subscriber. With zero retention the entry dies with its
    /// last subscriber; otherwise the retention clock starts.
    pub(crate) fn release(&self, key: QueryKey) {
        let mut state = self.inner.lock_state();
        let StoreState { entries, in_flight } = &mut *state;
        if let Some(entry) = entries.get_mut(&key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            if entry.subscribers == 0 {
                if entry.retention.is_zero() && !in_flight.contains_key(&key) {
                    entries.remove(&key);
                    tracing::debug!(%key, "evicted");
                } else {
                    entry.released_at = Some(Instant::now());
                }
            }
        }
    }

    /// Evict entries whose retention window elapsed with no subscribers.
    /// Returns the number of evicted entries.
    pub fn sweep(&self) -> usize {
        let mut state = self.inner.lock_state();
        let StoreState { entries, in_flight } = &mut *state;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|key, entry| {
            if entry.subscribers > 0 || in_flight.contains_key(key) {
                return true;
            }
            match entry.released_at {
                Some(at) => now.duration_since(at) < entry.retention,
                None => true,
            }
        });
        before - entries.len()
    }

    /// Run [`QueryCache::sweep`] periodically. `interval` must be nonzero.
    /// Abort the handle to stop the sweeper.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = cache.sweep();
                if evicted > 0 {
                    tracing::debug!(evicted, "evicted unused cache entries");
                }
            }
        })
    }
}
