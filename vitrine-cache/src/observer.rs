//! Live subscriptions to cache keys.
//!
//! An observer registers interest in a key with a supplier and a callback;
//! the callback fires on every state transition for that key until the
//! observer detaches. Detachment is explicit and idempotent, and never
//! cancels a request other subscribers are waiting on.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use vitrine_core::QueryKey;

use crate::entry::QuerySnapshot;
use crate::fetcher::QueryFetcher;
use crate::staleness::QueryOptions;
use crate::store::{QueryCache, QueryEvent};

/// Live subscription to one cache key.
///
/// Construction delivers an immediate snapshot, then (when enabled and the
/// value is missing or stale) triggers a fetch. Every subsequent state
/// transition for the key is delivered through the callback. Dropping the
/// observer detaches it.
pub struct QueryObserver<T> {
    cache: QueryCache,
    key: QueryKey,
    options: QueryOptions,
    fetcher: Arc<dyn QueryFetcher>,
    task: JoinHandle<()>,
    detached: AtomicBool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> QueryObserver<T>
where
    T: DeserializeOwned + Send + 'static,
{
    pub fn new(
        cache: &QueryCache,
        key: QueryKey,
        options: QueryOptions,
        fetcher: Arc<dyn QueryFetcher>,
        on_change: impl Fn(QuerySnapshot<T>) + Send + Sync + 'static,
    ) -> Self {
        cache.acquire(key, options.retention);
        // Subscribe before the initial fetch so no transition is missed.
        let mut events = cache.subscribe_events();

        let task = tokio::spawn({
            let cache = cache.clone();
            let options = options.clone();
            let fetcher = Arc::clone(&fetcher);
            async move {
                on_change(Self::current(&cache, key));
                if options.enabled {
                    cache.fetch(key, &options, &fetcher).await;
                }
                loop {
                    match events.recv().await {
                        Ok(QueryEvent::Updated { key: updated }) if updated == key => {
                            on_change(Self::current(&cache, key));
                        }
                        Ok(QueryEvent::Invalidated { key: invalidated })
                            if invalidated == key =>
                        {
                            if options.enabled && cache.network().is_online() {
                                cache.fetch(key, &options, &fetcher).await;
                            } else {
                                on_change(Self::current(&cache, key));
                            }
                        }
                        Ok(QueryEvent::NetworkResumed) => {
                            // The read path serves a still-fresh value
                            // without a request, so this only refetches
                            // paused or stale entries.
                            if options.enabled {
                                cache.fetch(key, &options, &fetcher).await;
                            }
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(_)) => {
                            on_change(Self::current(&cache, key));
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });

        Self {
            cache: cache.clone(),
            key,
            options,
            fetcher,
            task,
            detached: AtomicBool::new(false),
            _marker: PhantomData,
        }
    }

    fn current(cache: &QueryCache, key: QueryKey) -> QuerySnapshot<T> {
        match cache.peek(key) {
            Some(snapshot) => snapshot.decode(key),
            None => QuerySnapshot::empty(),
        }
    }

    /// Current typed view of the key.
    pub fn snapshot(&self) -> QuerySnapshot<T> {
        Self::current(&self.cache, self.key)
    }

    /// Manual refresh, ignoring the staleness window. A disabled observer
    /// never issues a network call, manual refresh included.
    pub async fn refetch(&self) -> QuerySnapshot<T> {
        self.cache
            .refetch(self.key, &self.options, &self.fetcher)
            .await
            .decode(self.key)
    }

    pub fn key(&self) -> QueryKey {
        self.key
    }
}

impl<T> QueryObserver<T> {
    /// Detach from the key. Idempotent; the callback does not fire after
    /// this returns, and any in-flight request is left to complete for the
    /// remaining subscribers.
    pub fn detach(&self) {
        if !self.detached.swap(true, Ordering::SeqCst) {
            self.task.abort();
            self.cache.release(self.key);
        }
    }
}

impl<T> Drop for QueryObserver<T> {
    fn drop(&mut self) {
        self.detach();
    }
}
