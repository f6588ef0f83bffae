//! SQLite-backed live operation store.
//!
//! # Responsibility
//! - Serve watch attachments with a consistent snapshot + registration.
//! - Re-read and fan out the affected id after every write.
//!
//! # Invariants
//! - The connection mutex is never held while observers run.
//! - Watcher bookkeeping is per-id; unrelated ids are never notified.

use crate::model::operation::{Operation, OperationId};
use crate::repo::operation_repo::{OperationRepository, SqliteOperationRepository};
use crate::store::{OperationStore, RecordObserver, StoreResult, Watch, WatchGuard, WatchSnapshot};
use log::{debug, info};
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Live store over one SQLite connection.
///
/// Shareable across multiple view-model instances; all access is
/// serialized on the internal connection mutex.
pub struct SqliteOperationStore {
    conn: Mutex<Connection>,
    registry: Arc<WatcherRegistry>,
}

#[derive(Default)]
struct WatcherRegistry {
    watchers: Mutex<BTreeMap<OperationId, BTreeMap<u64, RecordObserver>>>,
    next_watch_id: AtomicU64,
}

impl WatcherRegistry {
    fn attach(&self, id: OperationId, observer: RecordObserver) -> u64 {
        let watch_id = self.next_watch_id.fetch_add(1, Ordering::Relaxed);
        lock_unpoisoned(&self.watchers)
            .entry(id)
            .or_default()
            .insert(watch_id, observer);
        watch_id
    }

    fn detach(&self, id: OperationId, watch_id: u64) {
        let mut watchers = lock_unpoisoned(&self.watchers);
        if let Some(for_id) = watchers.get_mut(&id) {
            for_id.remove(&watch_id);
            if for_id.is_empty() {
                watchers.remove(&id);
            }
        }
    }

    fn observers_for(&self, id: OperationId) -> Vec<RecordObserver> {
        lock_unpoisoned(&self.watchers)
            .get(&id)
            .map(|for_id| for_id.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl SqliteOperationStore {
    /// Wraps an already-bootstrapped connection (migrations applied).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            registry: Arc::new(WatcherRegistry::default()),
        }
    }

    /// Inserts a record and notifies watchers of the assigned id.
    pub fn insert(&self, operand_a: i64, operand_b: i64) -> StoreResult<OperationId> {
        let id = {
            let conn = lock_unpoisoned(&self.conn);
            SqliteOperationRepository::new(&conn).insert_operation(operand_a, operand_b)?
        };
        info!("event=store_insert module=store status=ok id={id}");

        self.notify_watchers(id)?;
        Ok(id)
    }

    /// Overwrites an existing record and notifies its watchers.
    pub fn update(&self, operation: &Operation) -> StoreResult<()> {
        {
            let conn = lock_unpoisoned(&self.conn);
            SqliteOperationRepository::new(&conn).update_operation(operation)?;
        }
        info!(
            "event=store_update module=store status=ok id={}",
            operation.id
        );

        self.notify_watchers(operation.id)
    }

    /// Deletes a record; its watchers observe the transition to absent.
    pub fn delete(&self, id: OperationId) -> StoreResult<()> {
        {
            let conn = lock_unpoisoned(&self.conn);
            SqliteOperationRepository::new(&conn).delete_operation(id)?;
        }
        info!("event=store_delete module=store status=ok id={id}");

        self.notify_watchers(id)
    }

    /// One-shot read of the stored value for an id.
    pub fn get(&self, id: OperationId) -> StoreResult<Option<Operation>> {
        let conn = lock_unpoisoned(&self.conn);
        Ok(SqliteOperationRepository::new(&conn).get_operation(id)?)
    }

    /// Lists all stored operations ordered by id.
    pub fn list(&self) -> StoreResult<Vec<Operation>> {
        let conn = lock_unpoisoned(&self.conn);
        Ok(SqliteOperationRepository::new(&conn).list_operations()?)
    }

    fn notify_watchers(&self, id: OperationId) -> StoreResult<()> {
        let observers = self.registry.observers_for(id);
        if observers.is_empty() {
            return Ok(());
        }

        let record = self.get(id)?;
        debug!(
            "event=store_notify module=store id={id} watchers={} present={}",
            observers.len(),
            record.is_some()
        );

        for observer in observers {
            observer(record);
        }
        Ok(())
    }
}

impl OperationStore for SqliteOperationStore {
    fn watch(&self, id: OperationId, observer: RecordObserver) -> StoreResult<Watch> {
        let initial = self.get(id)?;
        let watch_id = self.registry.attach(id, observer);
        debug!(
            "event=store_watch module=store id={id} watch_id={watch_id} present={}",
            initial.is_some()
        );

        let registry: Weak<WatcherRegistry> = Arc::downgrade(&self.registry);
        let guard = WatchGuard::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.detach(id, watch_id);
            }
        });

        Ok(Watch {
            snapshot: WatchSnapshot::Ready(initial),
            guard,
        })
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
