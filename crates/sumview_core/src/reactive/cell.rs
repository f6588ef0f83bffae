//! Observable cell, read-only reader, and RAII subscription.
//!
//! # Responsibility
//! - Hold one value and fan out synchronous change notifications.
//! - Separate the writable handle (`ObservableCell`) from the
//!   read-subscribable handle (`CellReader`) handed to UI layers.
//!
//! # Invariants
//! - `set` notifies on every call, including writes of an equal value.
//! - Notification happens after the value is committed, so observers that
//!   call `get` on any cell see fully settled state.
//! - Dropping a `Subscription` detaches its observer.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct CellShared<T> {
    value: Mutex<T>,
    observers: Mutex<BTreeMap<u64, Observer<T>>>,
    next_observer_id: AtomicU64,
}

impl<T> CellShared<T> {
    fn detach(&self, observer_id: u64) {
        lock_unpoisoned(&self.observers).remove(&observer_id);
    }
}

/// Writable observable value container.
///
/// The counterpart of a mutable binding source: owners write through `set`,
/// dependents attach through `subscribe` or a `CellReader`.
pub struct ObservableCell<T> {
    shared: Arc<CellShared<T>>,
}

impl<T> Clone for ObservableCell<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ObservableCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            shared: Arc::new(CellShared {
                value: Mutex::new(initial),
                observers: Mutex::new(BTreeMap::new()),
                next_observer_id: AtomicU64::new(1),
            }),
        }
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        lock_unpoisoned(&self.shared.value).clone()
    }

    /// Commits a new value and synchronously notifies all observers.
    pub fn set(&self, value: T) {
        {
            let mut current = lock_unpoisoned(&self.shared.value);
            *current = value.clone();
        }
        notify(&self.shared, &value);
    }

    /// Attaches an observer for future changes.
    ///
    /// The current value is not replayed; callers needing it read `get`
    /// first. The observer stays attached until the returned guard drops.
    pub fn subscribe(&self, observer: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        subscribe_shared(&self.shared, observer)
    }

    /// Returns a read-only handle onto this cell.
    pub fn reader(&self) -> CellReader<T> {
        CellReader {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Read-only handle onto an observable cell.
///
/// This is what binding consumers receive: current value via `get`, future
/// values via `subscribe`, no way to write.
pub struct CellReader<T> {
    shared: Arc<CellShared<T>>,
}

impl<T> Clone for CellReader<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> CellReader<T> {
    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        lock_unpoisoned(&self.shared.value).clone()
    }

    /// Attaches an observer for future changes.
    pub fn subscribe(&self, observer: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        subscribe_shared(&self.shared, observer)
    }
}

/// RAII guard for an attached observer.
///
/// Dropping the guard detaches the observer; leaking it keeps the
/// subscription alive for the process lifetime.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

fn subscribe_shared<T: Clone + Send + Sync + 'static>(
    shared: &Arc<CellShared<T>>,
    observer: impl Fn(&T) + Send + Sync + 'static,
) -> Subscription {
    let observer_id = shared.next_observer_id.fetch_add(1, Ordering::Relaxed);
    lock_unpoisoned(&shared.observers).insert(observer_id, Arc::new(observer));

    let weak: Weak<CellShared<T>> = Arc::downgrade(shared);
    Subscription::new(move || {
        if let Some(shared) = weak.upgrade() {
            shared.detach(observer_id);
        }
    })
}

fn notify<T>(shared: &CellShared<T>, value: &T) {
    // Snapshot the observer list so callbacks run without the registry
    // lock held; observers attached mid-notify see only later writes.
    let observers: Vec<Observer<T>> = lock_unpoisoned(&shared.observers)
        .values()
        .cloned()
        .collect();

    for observer in observers {
        observer(value);
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
