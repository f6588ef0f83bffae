use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use sumview_core::db::open_db_in_memory;
use sumview_core::{
    seed_demo_operations, Operation, OperationId, OperationStore, OperationViewModel,
    RecordObserver, SqliteOperationStore, StoreResult, Watch, WatchGuard, WatchSnapshot,
};

fn seeded_store() -> Arc<SqliteOperationStore> {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteOperationStore::new(conn);
    seed_demo_operations(&store).unwrap();
    Arc::new(store)
}

fn seeded_view_model() -> (Arc<SqliteOperationStore>, OperationViewModel) {
    let store = seeded_store();
    let handle: Arc<dyn OperationStore> = store.clone();
    let view_model = OperationViewModel::new(handle);
    (store, view_model)
}

fn bound_texts(view_model: &OperationViewModel) -> (String, String, String) {
    (
        view_model.observe_operand_a_text().get(),
        view_model.observe_operand_b_text().get(),
        view_model.observe_result_text().get(),
    )
}

#[test]
fn initialization_binds_first_record() {
    let (_store, view_model) = seeded_view_model();

    assert_eq!(view_model.current_id(), 1);
    assert_eq!(
        bound_texts(&view_model),
        ("1".to_string(), "1".to_string(), "2".to_string())
    );
}

#[test]
fn present_record_derives_texts_and_sum() {
    let (_store, view_model) = seeded_view_model();

    view_model.set_current_id(4);

    assert_eq!(
        bound_texts(&view_model),
        ("420".to_string(), "69".to_string(), "489".to_string())
    );
}

#[test]
fn absent_record_folds_all_texts_to_empty() {
    let (_store, view_model) = seeded_view_model();

    view_model.set_current_id(99);
    assert_eq!(
        bound_texts(&view_model),
        (String::new(), String::new(), String::new())
    );

    // No lower-bound clamp: ids <= 0 simply resolve to absent.
    view_model.set_current_id(1);
    view_model.previous();
    assert_eq!(view_model.current_id(), 0);
    assert_eq!(
        bound_texts(&view_model),
        (String::new(), String::new(), String::new())
    );
}

#[test]
fn demo_navigation_scenario_matches_seeded_records() {
    let (_store, view_model) = seeded_view_model();
    assert_eq!(view_model.observe_result_text().get(), "2");

    view_model.next();
    view_model.next();
    view_model.next();
    assert_eq!(view_model.current_id(), 4);
    assert_eq!(view_model.observe_result_text().get(), "489");

    view_model.previous();
    assert_eq!(view_model.current_id(), 3);
    assert_eq!(view_model.observe_result_text().get(), "6");
}

#[test]
fn manual_edits_recompute_result_without_touching_store() {
    let (store, view_model) = seeded_view_model();

    view_model.set_operand_a_text("10");
    view_model.set_operand_b_text("-3");
    assert_eq!(view_model.observe_result_text().get(), "7");

    // The persisted record is untouched by edits.
    assert_eq!(store.get(1).unwrap(), Some(Operation::new(1, 1, 1)));
}

#[test]
fn unparsable_operand_folds_result_to_empty() {
    let (_store, view_model) = seeded_view_model();

    view_model.set_operand_a_text("abc");
    assert_eq!(view_model.observe_operand_b_text().get(), "1");
    assert_eq!(view_model.observe_result_text().get(), "");

    view_model.set_operand_a_text("2");
    view_model.set_operand_b_text("");
    assert_eq!(view_model.observe_result_text().get(), "");
}

#[test]
fn navigation_overwrites_manual_edits_with_record_values() {
    let (_store, view_model) = seeded_view_model();

    view_model.set_operand_a_text("abc");
    assert_eq!(view_model.observe_result_text().get(), "");

    view_model.next();
    assert_eq!(
        bound_texts(&view_model),
        ("2".to_string(), "2".to_string(), "4".to_string())
    );
}

#[test]
fn manual_edits_on_absent_record_still_drive_result() {
    let (_store, view_model) = seeded_view_model();
    view_model.set_current_id(99);

    view_model.set_operand_a_text("5");
    view_model.set_operand_b_text("6");

    assert_eq!(view_model.observe_result_text().get(), "11");
}

#[test]
fn out_of_band_store_update_reaches_bound_texts() {
    let (store, view_model) = seeded_view_model();

    store.update(&Operation::new(1, 40, 2)).unwrap();

    assert_eq!(
        bound_texts(&view_model),
        ("40".to_string(), "2".to_string(), "42".to_string())
    );
}

#[test]
fn out_of_band_update_overwrites_manual_edit() {
    let (store, view_model) = seeded_view_model();

    view_model.set_operand_a_text("abc");
    store.update(&Operation::new(1, 8, 9)).unwrap();

    assert_eq!(
        bound_texts(&view_model),
        ("8".to_string(), "9".to_string(), "17".to_string())
    );
}

#[test]
fn out_of_band_delete_folds_texts_to_empty() {
    let (store, view_model) = seeded_view_model();

    store.delete(1).unwrap();

    assert_eq!(
        bound_texts(&view_model),
        (String::new(), String::new(), String::new())
    );
}

#[test]
fn result_subscribers_observe_navigation_changes() {
    let (_store, view_model) = seeded_view_model();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let _sub = view_model
        .observe_result_text()
        .subscribe(move |value: &String| {
            sink.lock().unwrap().push(value.clone());
        });

    view_model.next();

    let settled = seen.lock().unwrap().last().cloned();
    assert_eq!(settled, Some("4".to_string()));
}

// --- switch-latest law against a scripted store ------------------------

/// Store double whose lookups never resolve on their own: `watch` records
/// the observer and returns a pending snapshot, and the test resolves ids
/// explicitly via `deliver`. Guards are no-ops so a
/// superseded observer can still fire, like an in-flight notification
/// snapshotted before detach.
#[derive(Default)]
struct ScriptedStore {
    records: Mutex<BTreeMap<OperationId, Operation>>,
    watches: Mutex<Vec<(OperationId, RecordObserver)>>,
}

impl ScriptedStore {
    fn with_records(records: &[Operation]) -> Arc<Self> {
        let store = Self::default();
        {
            let mut map = store.records.lock().unwrap();
            for record in records {
                map.insert(record.id, *record);
            }
        }
        Arc::new(store)
    }

    fn deliver(&self, id: OperationId) {
        let record = self.records.lock().unwrap().get(&id).copied();
        let observers: Vec<RecordObserver> = self
            .watches
            .lock()
            .unwrap()
            .iter()
            .filter(|(watched_id, _)| *watched_id == id)
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in observers {
            observer(record);
        }
    }

    fn watched_ids(&self) -> Vec<OperationId> {
        self.watches
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }
}

impl OperationStore for ScriptedStore {
    fn watch(&self, id: OperationId, observer: RecordObserver) -> StoreResult<Watch> {
        self.watches.lock().unwrap().push((id, observer));
        Ok(Watch {
            snapshot: WatchSnapshot::Pending,
            guard: WatchGuard::new(|| {}),
        })
    }
}

#[test]
fn only_latest_requested_id_commits_even_when_results_arrive_out_of_order() {
    let store = ScriptedStore::with_records(&[
        Operation::new(1, 1, 1),
        Operation::new(2, 2, 2),
        Operation::new(3, 3, 3),
    ]);
    let handle: Arc<dyn OperationStore> = store.clone();
    let view_model = OperationViewModel::new(handle);

    // All lookups still pending: everything is empty.
    assert_eq!(
        bound_texts(&view_model),
        (String::new(), String::new(), String::new())
    );

    view_model.set_current_id(2);
    view_model.set_current_id(3);
    assert_eq!(store.watched_ids(), vec![1, 2, 3]);

    // The latest lookup resolves first and commits.
    store.deliver(3);
    assert_eq!(
        bound_texts(&view_model),
        ("3".to_string(), "3".to_string(), "6".to_string())
    );

    // Superseded lookups resolving afterwards are discarded, not merged.
    store.deliver(2);
    store.deliver(1);
    assert_eq!(view_model.current_id(), 3);
    assert_eq!(
        bound_texts(&view_model),
        ("3".to_string(), "3".to_string(), "6".to_string())
    );
}

#[test]
fn pending_lookup_leaves_previous_texts_in_place_until_it_resolves() {
    let store = ScriptedStore::with_records(&[Operation::new(1, 1, 1)]);
    let handle: Arc<dyn OperationStore> = store.clone();
    let view_model = OperationViewModel::new(handle);

    store.deliver(1);
    assert_eq!(
        bound_texts(&view_model),
        ("1".to_string(), "1".to_string(), "2".to_string())
    );

    // A lookup that never resolves leaves the previous values visible.
    view_model.set_current_id(2);
    assert_eq!(
        bound_texts(&view_model),
        ("1".to_string(), "1".to_string(), "2".to_string())
    );
}
