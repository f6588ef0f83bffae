//! Core domain logic for SumView.
//! This crate is the single source of truth for binding and persistence
//! invariants; UI layers only subscribe and forward intents.

pub mod db;
pub mod logging;
pub mod model;
pub mod reactive;
pub mod repo;
pub mod store;
pub mod viewmodel;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::operation::{Operation, OperationId};
pub use reactive::cell::{CellReader, ObservableCell, Subscription};
pub use repo::operation_repo::{
    OperationRepository, RepoError, RepoResult, SqliteOperationRepository,
};
pub use store::{
    seed_demo_operations, OperationStore, RecordObserver, SqliteOperationStore, StoreError,
    StoreResult, Watch, WatchGuard, WatchSnapshot,
};
pub use viewmodel::operation_view_model::OperationViewModel;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
