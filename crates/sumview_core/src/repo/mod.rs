//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for operation records.
//! - Isolate SQLite query details from the store and binding layers.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Absent rows on read are `Ok(None)`, never an error.

pub mod operation_repo;
