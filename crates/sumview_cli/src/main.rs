//! CLI demo entry point.
//!
//! # Responsibility
//! - Stand in for the presentation surface: seed an in-memory store, bind
//!   a view-model, and replay the demo navigation/edit scenario.
//! - Keep output deterministic for quick local sanity checks.

use std::process::ExitCode;
use std::sync::Arc;

use log::info;
use sumview_core::db::open_db_in_memory;
use sumview_core::{
    core_version, default_log_level, init_logging, seed_demo_operations, Operation,
    OperationStore, OperationViewModel, SqliteOperationStore,
};

fn main() -> ExitCode {
    // Logging is opt-in for the demo; the binding scenario below prints to
    // stdout either way.
    if let Ok(log_dir) = std::env::var("SUMVIEW_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("sumview: logging init failed: {err}");
            return ExitCode::FAILURE;
        }
    }

    match run_demo() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("sumview: demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_demo() -> Result<(), Box<dyn std::error::Error>> {
    println!("sumview_core version={}", core_version());

    let conn = open_db_in_memory()?;
    let store = Arc::new(SqliteOperationStore::new(conn));
    let ids = seed_demo_operations(&store)?;
    info!("event=demo_seeded module=cli count={}", ids.len());

    let store_handle: Arc<dyn OperationStore> = store.clone();
    let view_model = OperationViewModel::new(store_handle);
    print_bound_state("initialized", &view_model);

    view_model.next();
    view_model.next();
    view_model.next();
    print_bound_state("after next x3", &view_model);

    view_model.previous();
    print_bound_state("after previous", &view_model);

    view_model.set_operand_a_text("abc");
    print_bound_state("after manual edit 'abc'", &view_model);

    view_model.set_current_id(1);
    print_bound_state("back at id 1", &view_model);

    // Out-of-band data edit: the store notifies the watched id, no
    // navigation call involved.
    store.update(&Operation::new(1, 40, 2))?;
    print_bound_state("after store update", &view_model);

    Ok(())
}

fn print_bound_state(label: &str, view_model: &OperationViewModel) {
    println!(
        "{label}: id={} a={:?} b={:?} result={:?}",
        view_model.current_id(),
        view_model.observe_operand_a_text().get(),
        view_model.observe_operand_b_text().get(),
        view_model.observe_result_text().get()
    );
}
