//! Presentation-facing binding graphs.
//!
//! # Responsibility
//! - Own the observable cells one screen binds to.
//! - Keep derivation wiring out of UI and storage layers.
//!
//! # Invariants
//! - View-models consume stores through the `OperationStore` contract only;
//!   they never issue writes.

pub mod operation_view_model;
