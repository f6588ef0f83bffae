//! Operation navigation and sum binding graph.
//!
//! # Responsibility
//! - Maintain the cell graph: current id -> watched record -> operand
//!   texts -> result text.
//! - Serialize every propagation (user edits, navigation, store
//!   deliveries) onto one update path.
//!
//! # Invariants
//! - `current_id` always holds a valid id; it starts at 1.
//! - Only the lookup matching the latest requested id may commit into
//!   `current_record`; superseded deliveries are discarded, never queued.
//! - A record-derived update overwrites manual operand edits.
//! - Recoverable conditions (absent record, unparsable operand, store
//!   transport failure) fold to empty strings; no error reaches the UI.

use crate::model::operation::{Operation, OperationId};
use crate::reactive::cell::{CellReader, ObservableCell, Subscription};
use crate::store::{OperationStore, RecordObserver, WatchGuard, WatchSnapshot};
use log::{debug, error};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const INITIAL_OPERATION_ID: OperationId = 1;

/// Binding graph for one operation-viewer session.
///
/// Construction wires all derivations and issues the lookup for id 1; the
/// presentation surface then only subscribes to the text readers and
/// forwards intents.
pub struct OperationViewModel {
    store: Arc<dyn OperationStore>,
    current_id: ObservableCell<OperationId>,
    current_record: ObservableCell<Option<Operation>>,
    operand_a_text: ObservableCell<String>,
    operand_b_text: ObservableCell<String>,
    result_text: ObservableCell<String>,
    lookup: Arc<Mutex<LookupState>>,
    // Serializes user edits, navigation and store deliveries so no two
    // derivation steps for the same cell interleave.
    propagation: Arc<Mutex<()>>,
    _wiring: Vec<Subscription>,
}

struct LookupState {
    generation: u64,
    watch: Option<WatchGuard>,
}

impl OperationViewModel {
    /// Builds the graph bound to `store` and resolves the initial record.
    pub fn new(store: Arc<dyn OperationStore>) -> Self {
        let current_id = ObservableCell::new(INITIAL_OPERATION_ID);
        let current_record = ObservableCell::new(None::<Operation>);
        let operand_a_text = ObservableCell::new(String::new());
        let operand_b_text = ObservableCell::new(String::new());
        let result_text = ObservableCell::new(String::new());

        let mut wiring = Vec::new();

        // Record -> operand texts. Present records overwrite whatever the
        // user typed since the last navigation; absent records blank both.
        let a_sink = operand_a_text.clone();
        wiring.push(current_record.subscribe(move |record: &Option<Operation>| {
            a_sink.set(match record {
                Some(operation) => operation.operand_a.to_string(),
                None => String::new(),
            });
        }));
        let b_sink = operand_b_text.clone();
        wiring.push(current_record.subscribe(move |record: &Option<Operation>| {
            b_sink.set(match record {
                Some(operation) => operation.operand_b.to_string(),
                None => String::new(),
            });
        }));

        // Operand texts -> result. Each recomputation reads the other cell
        // at that moment, not a snapshot from wiring time.
        let result_sink = result_text.clone();
        let other_b = operand_b_text.reader();
        wiring.push(operand_a_text.subscribe(move |a_text: &String| {
            result_sink.set(derive_result_text(a_text, &other_b.get()));
        }));
        let result_sink = result_text.clone();
        let other_a = operand_a_text.reader();
        wiring.push(operand_b_text.subscribe(move |b_text: &String| {
            result_sink.set(derive_result_text(&other_a.get(), b_text));
        }));

        let view_model = Self {
            store,
            current_id,
            current_record,
            operand_a_text,
            operand_b_text,
            result_text,
            lookup: Arc::new(Mutex::new(LookupState {
                generation: 0,
                watch: None,
            })),
            propagation: Arc::new(Mutex::new(())),
            _wiring: wiring,
        };

        {
            let _guard = lock_unpoisoned(&view_model.propagation);
            view_model.set_current_id_locked(INITIAL_OPERATION_ID);
        }

        view_model
    }

    /// Selects the record to display; absent ids fold to empty texts.
    ///
    /// No bounds checking is performed.
    pub fn set_current_id(&self, id: OperationId) {
        let _guard = lock_unpoisoned(&self.propagation);
        self.set_current_id_locked(id);
    }

    /// Navigates to the following record.
    pub fn next(&self) {
        let _guard = lock_unpoisoned(&self.propagation);
        let id = self.current_id.get();
        self.set_current_id_locked(id.wrapping_add(1));
    }

    /// Navigates to the preceding record; ids <= 0 resolve to absent.
    pub fn previous(&self) {
        let _guard = lock_unpoisoned(&self.propagation);
        let id = self.current_id.get();
        self.set_current_id_locked(id.wrapping_sub(1));
    }

    /// Overwrites the left operand text, as typed by the user.
    ///
    /// Does not write back to the store and does not alter the current
    /// record; the next record delivery re-derives the text.
    pub fn set_operand_a_text(&self, value: impl Into<String>) {
        let _guard = lock_unpoisoned(&self.propagation);
        self.operand_a_text.set(value.into());
    }

    /// Overwrites the right operand text, as typed by the user.
    pub fn set_operand_b_text(&self, value: impl Into<String>) {
        let _guard = lock_unpoisoned(&self.propagation);
        self.operand_b_text.set(value.into());
    }

    /// Returns the currently selected id, for navigation chrome.
    pub fn current_id(&self) -> OperationId {
        self.current_id.get()
    }

    /// Live handle onto the left operand text.
    pub fn observe_operand_a_text(&self) -> CellReader<String> {
        self.operand_a_text.reader()
    }

    /// Live handle onto the right operand text.
    pub fn observe_operand_b_text(&self) -> CellReader<String> {
        self.operand_b_text.reader()
    }

    /// Live handle onto the derived sum text.
    pub fn observe_result_text(&self) -> CellReader<String> {
        self.result_text.reader()
    }

    /// Core id-change path. Caller must hold the propagation mutex.
    fn set_current_id_locked(&self, id: OperationId) {
        let generation = {
            let mut lookup = lock_unpoisoned(&self.lookup);
            lookup.generation = lookup.generation.wrapping_add(1);
            // Detach the superseded watch before the new lookup is issued;
            // its in-flight deliveries fail the generation check below.
            lookup.watch = None;
            lookup.generation
        };

        self.current_id.set(id);
        debug!("event=lookup_issue module=viewmodel id={id} generation={generation}");

        let propagation = Arc::clone(&self.propagation);
        let lookup = Arc::clone(&self.lookup);
        let record_cell = self.current_record.clone();
        let observer: RecordObserver = Arc::new(move |record| {
            let _guard = lock_unpoisoned(&propagation);
            commit_record(&lookup, &record_cell, generation, record);
        });

        match self.store.watch(id, observer) {
            Ok(watch) => {
                lock_unpoisoned(&self.lookup).watch = Some(watch.guard);
                match watch.snapshot {
                    WatchSnapshot::Ready(record) => {
                        commit_record(&self.lookup, &self.current_record, generation, record);
                    }
                    // Previous record/text values stay in place until the
                    // lookup resolves through the observer.
                    WatchSnapshot::Pending => {
                        debug!(
                            "event=lookup_pending module=viewmodel id={id} generation={generation}"
                        );
                    }
                }
            }
            Err(err) => {
                error!(
                    "event=lookup_failed module=viewmodel id={id} generation={generation} error={err}"
                );
                commit_record(&self.lookup, &self.current_record, generation, None);
            }
        }
    }
}

/// Commits a lookup delivery into the record cell.
///
/// Caller must hold the propagation mutex. Deliveries tagged with a
/// superseded generation are discarded.
fn commit_record(
    lookup: &Mutex<LookupState>,
    record_cell: &ObservableCell<Option<Operation>>,
    generation: u64,
    record: Option<Operation>,
) {
    let current_generation = lock_unpoisoned(lookup).generation;
    if current_generation != generation {
        debug!(
            "event=lookup_discard module=viewmodel generation={generation} current={current_generation}"
        );
        return;
    }

    record_cell.set(record);
}

/// Derives the displayed sum from both operand texts.
///
/// Both must parse as base-10 integers; anything else (empty text,
/// non-numeric input, overflow) folds to the empty string.
fn derive_result_text(operand_a: &str, operand_b: &str) -> String {
    let (Ok(a), Ok(b)) = (operand_a.parse::<i64>(), operand_b.parse::<i64>()) else {
        return String::new();
    };

    a.checked_add(b)
        .map(|sum| sum.to_string())
        .unwrap_or_default()
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
