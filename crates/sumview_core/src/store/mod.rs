//! Live-subscribable record store over operation persistence.
//!
//! # Responsibility
//! - Define the lookup-by-id contract consumed by the binding layer:
//!   a current snapshot plus change notifications for that id.
//! - Route administrative writes (seeding, out-of-band edits) through a
//!   path that notifies attached watchers.
//!
//! # Invariants
//! - The reactive core only reads; every mutation enters through the
//!   store's own write API.
//! - Watch observers are invoked with no store-internal locks held.
//! - A dropped `WatchGuard` detaches its observer; late notifications for
//!   detached watches are never delivered.

use crate::model::operation::{Operation, OperationId};
use crate::repo::operation_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

mod sqlite_store;

pub use sqlite_store::SqliteOperationStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error wrapping repository and transport failures.
#[derive(Debug)]
pub enum StoreError {
    Repo(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Callback receiving the stored value for a watched id after each change.
///
/// `None` means no record currently matches the id.
pub type RecordObserver = Arc<dyn Fn(Option<Operation>) + Send + Sync>;

/// Result of attaching a watch: the snapshot state at attach time plus the
/// guard keeping the observer registered.
///
/// The snapshot is returned by value rather than replayed through the
/// observer, so attaching never re-enters the caller.
pub struct Watch {
    /// Lookup state at the moment the watch was attached.
    pub snapshot: WatchSnapshot,
    /// Keeps the observer attached; drop to detach.
    pub guard: WatchGuard,
}

/// Lookup state at watch-attach time.
///
/// Embedded stores resolve synchronously and return `Ready`; a store whose
/// lookups complete elsewhere returns `Pending` and resolves through the
/// observer. Consumers keep their previous value while a lookup is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchSnapshot {
    /// The stored value was resolved at attach time (`None` = absent).
    Ready(Option<Operation>),
    /// Resolution arrives through the observer later, if at all.
    Pending,
}

/// RAII registration guard for one attached observer.
pub struct WatchGuard {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchGuard {
    /// Wraps the detach action a store implementation runs on drop.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for WatchGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchGuard")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Id-keyed, live-subscribable lookup contract consumed by the view-model.
///
/// Implementations must support repeated watches for different ids and
/// notify each observer whenever the stored value for its id changes, until
/// the corresponding guard is dropped.
pub trait OperationStore: Send + Sync {
    fn watch(&self, id: OperationId, observer: RecordObserver) -> StoreResult<Watch>;
}

/// Inserts the four fixture operations used by the demo and tests.
///
/// One-time setup; never invoked by the reactive core itself. Returns the
/// assigned ids in insertion order.
pub fn seed_demo_operations(store: &SqliteOperationStore) -> StoreResult<Vec<OperationId>> {
    const FIXTURES: [(i64, i64); 4] = [(1, 1), (2, 2), (3, 3), (420, 69)];

    let mut ids = Vec::with_capacity(FIXTURES.len());
    for (operand_a, operand_b) in FIXTURES {
        ids.push(store.insert(operand_a, operand_b)?);
    }
    Ok(ids)
}
