//! Operation domain model.
//!
//! # Responsibility
//! - Define the persisted record navigated and displayed by the view-model.
//!
//! # Invariants
//! - `id` is assigned by storage and never reused for another operation.
//! - Operands are plain integers; formatting/parsing is a binding concern.

use serde::{Deserialize, Serialize};

/// Stable identifier for a persisted operation.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type OperationId = i64;

/// Persisted pair of operands addressed by id.
///
/// The reactive core only ever reads these; creation and edits happen
/// through the store's administrative API (seeding, out-of-band updates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Storage-assigned row id used for navigation.
    pub id: OperationId,
    /// Left operand as entered/seeded.
    pub operand_a: i64,
    /// Right operand as entered/seeded.
    pub operand_b: i64,
}

impl Operation {
    /// Creates a record with a known id, as read back from storage.
    pub fn new(id: OperationId, operand_a: i64, operand_b: i64) -> Self {
        Self {
            id,
            operand_a,
            operand_b,
        }
    }
}
