//! Change-notification registry shared by the task and preference stores.
//!
//! # Invariants
//! - Observers are invoked in registration order.
//! - Callbacks run outside the registry lock; they may subscribe or
//!   unsubscribe without deadlocking.
//! - A panicking observer never prevents delivery to later observers.
//! - While `notify` runs, the dispatching thread is recorded so stores can
//!   reject writes issued from inside a handler.

use log::warn;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// Handle returned by `subscribe`; pass it to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

pub struct ObserverRegistry<E> {
    name: &'static str,
    next_id: AtomicU64,
    observers: Mutex<Vec<(SubscriptionId, Callback<E>)>>,
    dispatching: Mutex<Vec<ThreadId>>,
}

impl<E> ObserverRegistry<E> {
    /// `name` only appears in log lines.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            next_id: AtomicU64::new(1),
            observers: Mutex::new(Vec::new()),
            dispatching: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let callback: Callback<E> = Arc::new(callback);
        lock(&self.observers).push((id, callback));
        id
    }

    /// Returns `false` when `id` was not (or no longer) registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = lock(&self.observers);
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        lock(&self.observers).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the calling thread is currently inside `notify` on this registry.
    pub fn is_dispatching_on_current_thread(&self) -> bool {
        let current = thread::current().id();
        lock(&self.dispatching).contains(&current)
    }

    /// Delivers `event` to a snapshot of the current observers.
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<(SubscriptionId, Callback<E>)> = lock(&self.observers).clone();
        if snapshot.is_empty() {
            return;
        }

        let _dispatch = DispatchGuard::enter(&self.dispatching);
        for (id, callback) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                warn!(
                    "event=observer_panic module=observer status=error registry={} subscription={}",
                    self.name, id.0
                );
            }
        }
    }
}

struct DispatchGuard<'a> {
    dispatching: &'a Mutex<Vec<ThreadId>>,
    thread: ThreadId,
}

impl<'a> DispatchGuard<'a> {
    fn enter(dispatching: &'a Mutex<Vec<ThreadId>>) -> Self {
        let thread = thread::current().id();
        lock(dispatching).push(thread);
        Self {
            dispatching,
            thread,
        }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        let mut dispatching = lock(self.dispatching);
        if let Some(index) = dispatching.iter().position(|id| *id == self.thread) {
            dispatching.swap_remove(index);
        }
    }
}

// Poisoning only means an observer panicked mid-update of a plain Vec; the
// data is still structurally valid.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::ObserverRegistry;
    use std::sync::{Arc, Mutex};

    #[test]
    fn delivers_in_registration_order() {
        let registry = ObserverRegistry::<u32>::new("test");
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            registry.subscribe(move |value| seen.lock().unwrap().push((tag, *value)));
        }

        registry.notify(&7);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![("first", 7), ("second", 7), ("third", 7)]
        );
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let registry = ObserverRegistry::<()>::new("test");
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        let id = registry.subscribe(move |_| *counter.lock().unwrap() += 1);

        registry.notify(&());
        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        registry.notify(&());

        assert_eq!(*hits.lock().unwrap(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn panicking_observer_does_not_block_others() {
        let registry = ObserverRegistry::<()>::new("test");
        let hits = Arc::new(Mutex::new(0));
        registry.subscribe(|_| panic!("observer failure"));
        let counter = Arc::clone(&hits);
        registry.subscribe(move |_| *counter.lock().unwrap() += 1);

        registry.notify(&());

        assert_eq!(*hits.lock().unwrap(), 1);
        assert!(!registry.is_dispatching_on_current_thread());
    }

    #[test]
    fn dispatch_flag_is_visible_inside_handlers_only() {
        let registry = Arc::new(ObserverRegistry::<()>::new("test"));
        let observed = Arc::new(Mutex::new(None));
        let inner_registry = Arc::clone(&registry);
        let inner_observed = Arc::clone(&observed);
        registry.subscribe(move |_| {
            let dispatching = inner_registry.is_dispatching_on_current_thread();
            *inner_observed.lock().unwrap() = Some(dispatching);
        });

        assert!(!registry.is_dispatching_on_current_thread());
        registry.notify(&());

        assert_eq!(*observed.lock().unwrap(), Some(true));
        assert!(!registry.is_dispatching_on_current_thread());
    }
}
