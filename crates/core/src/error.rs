use crate::entity::{EntityId, EntityKind};

/// Failures of pure domain logic: bad input, or a referenced record that
/// the tracker does not have.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: EntityId },

    #[error("Invalid input: {0}")]
    Validation(String),
}
