//! Error taxonomy surfaced by the repository layer.

use strata_context::ContextError;
use strata_store::StoreError;
use thiserror::Error;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors surfaced by the repository layer.
///
/// Only three conditions are classified here: the two single-result
/// violations and referential-integrity save failures. Every other
/// failure passes through the transparent [`Context`](RepositoryError::Context)
/// variant untouched.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A single-result query matched nothing.
    #[error("{entity_type} was not found matching {filter}")]
    NotFound {
        entity_type: &'static str,
        filter: String,
    },

    /// A single-result query matched more than one entity.
    #[error("more than one {entity_type} ({count}) was found matching {filter}")]
    MultipleFound {
        entity_type: &'static str,
        filter: String,
        count: usize,
    },

    /// A save was rejected by a referential-integrity constraint. The
    /// store's error stays inspectable through `source()`.
    #[error("unable to save changes due to a referential integrity constraint violation")]
    ReferentialIntegrity {
        #[source]
        cause: StoreError,
    },

    /// Any failure the repository does not classify, re-raised unchanged.
    #[error(transparent)]
    Context(#[from] ContextError),
}
