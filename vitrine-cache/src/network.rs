//! Network status monitor.
//!
//! A single process-wide online/offline boolean with a subscriber registry.
//! The embedding environment feeds connectivity transitions in through
//! [`NetworkMonitor::set_online`]; the cache layer and any interested view
//! subscribe to drive pause/resume behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type OnlineCallback = Box<dyn Fn(bool) + Send + Sync>;

struct MonitorState {
    online: bool,
    subscribers: HashMap<u64, OnlineCallback>,
}

struct MonitorInner {
    state: Mutex<MonitorState>,
    next_id: AtomicU64,
}

/// Shared connectivity state.
///
/// Subscribers are invoked immediately with the current value and on every
/// transition thereafter. Notification happens under the registry lock, so
/// every subscriber observes the same value at any instant; callbacks must
/// not call back into the monitor.
#[derive(Clone)]
pub struct NetworkMonitor {
    inner: Arc<MonitorInner>,
}

impl NetworkMonitor {
    /// Create a monitor seeded with the environment-detected value.
    pub fn new(initial_online: bool) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                state: Mutex::new(MonitorState {
                    online: initial_online,
                    subscribers: HashMap::new(),
                }),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        // A poisoned lock only means a subscriber panicked; the boolean and
        // registry are still coherent.
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current connectivity, read synchronously.
    pub fn is_online(&self) -> bool {
        self.lock().online
    }

    /// Feed a connectivity transition in from the environment.
    ///
    /// A repeat of the current value is a no-op and notifies nobody.
    pub fn set_online(&self, online: bool) {
        let state = &mut *self.lock();
        if state.online == online {
            return;
        }
        state.online = online;
        tracing::info!(online, "network status changed");
        for callback in state.subscribers.values() {
            callback(online);
        }
    }

    /// Register a subscriber.
    ///
    /// The callback fires once immediately with the current value, then on
    /// every transition until the returned guard detaches. After
    /// [`NetworkSubscription::unsubscribe`] returns (or the guard drops),
    /// the callback is guaranteed not to fire again.
    pub fn subscribe(
        &self,
        callback: impl Fn(bool) + Send + Sync + 'static,
    ) -> NetworkSubscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let state = &mut *self.lock();
            callback(state.online);
            state.subscribers.insert(id, Box::new(callback));
        }
        NetworkSubscription {
            monitor: self.clone(),
            id,
            released: AtomicBool::new(false),
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.lock().subscribers.remove(&id);
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Guard for a monitor subscription. Detaches on drop.
pub struct NetworkSubscription {
    monitor: NetworkMonitor,
    id: u64,
    released: AtomicBool,
}

impl NetworkSubscription {
    /// Detach the subscriber. Idempotent.
    pub fn unsubscribe(&self) {
        if !self.released.swap(true, Ordering::SeqCst) {
            self.monitor.unsubscribe(self.id);
        }
    }
}

impl Drop for NetworkSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn subscriber_is_invoked_immediately_with_current_value() {
        let monitor = NetworkMonitor::new(false);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let _subscription = monitor.subscribe(move |online| {
            sink.lock().unwrap().push(online);
        });

        assert_eq!(*seen.lock().unwrap(), vec![false]);
    }

    #[test]
    fn transitions_notify_all_subscribers() {
        let monitor = NetworkMonitor::new(true);
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let first_sink = Arc::clone(&first);
        let _a = monitor.subscribe(move |_| {
            first_sink.fetch_add(1, Ordering::SeqCst);
        });
        let second_sink = Arc::clone(&second);
        let _b = monitor.subscribe(move |_| {
            second_sink.fetch_add(1, Ordering::SeqCst);
        });

        monitor.set_online(false);
        monitor.set_online(true);

        // One immediate invocation plus two transitions each.
        assert_eq!(first.load(Ordering::SeqCst), 3);
        assert_eq!(second.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn repeated_value_is_not_a_transition() {
        let monitor = NetworkMonitor::new(true);
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&calls);
        let _subscription = monitor.subscribe(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        monitor.set_online(true);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn no_callback_after_unsubscribe() {
        let monitor = NetworkMonitor::new(true);
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&calls);
        let subscription = monitor.subscribe(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        subscription.unsubscribe();
        subscription.unsubscribe();
        monitor.set_online(false);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_detaches() {
        let monitor = NetworkMonitor::new(true);
        let calls = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&calls);
        {
            let _subscription = monitor.subscribe(move |_| {
                sink.fetch_add(1, Ordering::SeqCst);
            });
        }
        monitor.set_online(false);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
