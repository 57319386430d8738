//! Unit-of-work context for the Strata data-access layer.
//!
//! A [`Context`] owns a store backend and a tracked-entity set: the
//! entities the current unit of work knows about, each carrying an
//! [`EntityState`](strata_types::EntityState). Staging operations move
//! entries through the state machine
//! (`Detached → Attached → {Unchanged, Modified, Deleted}`, with `Added`
//! entered directly by an insert), and `save_changes` commits the pending
//! set to the store in one round trip, in accumulation order.
//!
//! A context is one unit of work: use it from a single logical operation
//! at a time, then drop it. Cloning a `Context` clones the handle, not
//! the unit of work.

mod context;
mod error;
mod tracker;

pub use context::Context;
pub use error::{ContextError, ContextResult};
