//! Core type contracts for the Strata data-access layer.
//!
//! This crate defines the fundamental, store-agnostic vocabulary shared by
//! the context and repository layers:
//! - The [`Entity`] trait: what a caller-defined record must provide to be
//!   managed by a context (a collection name and a logical identity).
//! - The [`EntityState`] lifecycle an entity moves through inside a unit of
//!   work.
//!
//! Nothing here touches a store. Concrete backends live in `strata-store`,
//! the unit of work in `strata-context`.

mod entity;
mod state;

pub use entity::Entity;
pub use state::EntityState;
