//! Two-tier repository facade for the Strata data-access layer.
//!
//! [`ReadOnlyRepository`] exposes querying over one entity type: full
//! scans, predicate filtering, and single-result retrieval with exact
//! zero/one/many semantics. [`Repository`] adds the mutation tier:
//! staging inserts, full-row updates and deletes against the context's
//! tracked set, and a save operation that commits the pending change set
//! and translates referential-integrity failures into
//! [`RepositoryError::ReferentialIntegrity`].
//!
//! Classification happens only at this boundary and only for failures the
//! layer recognizes; everything else propagates verbatim. Nothing is
//! retried and nothing is logged; the caller owns recovery.

mod error;
mod predicate;
mod read_only;
mod repository;

pub use error::{RepositoryError, RepositoryResult};
pub use predicate::Predicate;
pub use read_only::ReadOnlyRepository;
pub use repository::Repository;

pub use strata_context::Context;
pub use strata_types::Entity;
