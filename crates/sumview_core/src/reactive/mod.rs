//! Observable value primitives for synchronous data binding.
//!
//! # Responsibility
//! - Provide value containers whose subscribers are notified on every write.
//! - Keep notification synchronous so dependent cells settle before the
//!   writer returns.
//!
//! # Invariants
//! - Observers run with no cell locks held; they may read or write other
//!   cells (the binding graph is acyclic by construction).

pub mod cell;
