//! Error types for the context layer.

use strata_store::StoreError;
use thiserror::Error;

/// Result type for context operations.
pub type ContextResult<T> = Result<T, ContextError>;

/// Errors that can occur in context operations.
#[derive(Debug, Error)]
pub enum ContextError {
    /// A store failure, surfaced untouched.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The operation requires the entity to be tracked by this context.
    #[error("{entity_type} {id} is not tracked by this context")]
    NotTracked {
        entity_type: &'static str,
        id: String,
    },

    /// The entity's row no longer exists in the store.
    #[error("{entity_type} {id} no longer exists in the store")]
    Missing {
        entity_type: &'static str,
        id: String,
    },
}
