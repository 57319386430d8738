//! Store boundary for the Strata data-access layer.
//!
//! Entities are persisted as typed JSON payloads keyed by collection name
//! and logical id. This crate defines the contract a backend must satisfy
//! and ships two embedded implementations:
//!
//! - [`MemoryStore`]: a process-local store, useful for tests and
//!   prototyping.
//! - [`SqliteStore`]: a single-table SQLite store.
//!
//! # Architecture
//!
//! - A commit applies a whole mutation batch or none of it.
//! - Constraint failures carry a structured [`ConstraintKind`] so callers
//!   classify on an enumerated reason code, never on message content.
//! - Referential rules between collections are declared per store as
//!   [`Reference`] values and validated after the batch is applied, so a
//!   child and its parent may arrive in the same batch in any order.

mod backend;
mod error;
mod memory;
mod record;
mod sqlite;

pub use backend::{StoreBackend, mock};
pub use error::{ConstraintKind, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use record::{Mutation, Record, Reference};
pub use sqlite::SqliteStore;
