//! Store backend abstraction.
//!
//! Defines the contract the context layer drives, allowing the unit of
//! work to run against any backend (in-memory, SQLite, or a remote store).

use crate::error::StoreResult;
use crate::record::{Mutation, Record};
use async_trait::async_trait;

/// A backend that can fetch collections and apply mutation batches.
///
/// Fetches read committed state only; a backend never sees staged changes
/// until they arrive in a commit batch. A commit is all-or-nothing: either
/// the whole batch is applied or the store is left untouched.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Returns every row of a collection, in the backend's own order.
    fn fetch_all(&self, entity_type: &str) -> StoreResult<Vec<Record>>;

    /// Returns one row by id, or `None` if it does not exist.
    fn fetch_one(&self, entity_type: &str, id: &str) -> StoreResult<Option<Record>>;

    /// Applies a mutation batch in order, atomically.
    fn commit(&self, batch: &[Mutation]) -> StoreResult<()>;

    /// Async version of [`fetch_all`](StoreBackend::fetch_all) for
    /// backends with a real I/O boundary. Embedded stores keep the
    /// default, which delegates to the sync implementation.
    async fn fetch_all_async(&self, entity_type: &str) -> StoreResult<Vec<Record>> {
        self.fetch_all(entity_type)
    }

    /// Async version of [`fetch_one`](StoreBackend::fetch_one).
    async fn fetch_one_async(&self, entity_type: &str, id: &str) -> StoreResult<Option<Record>> {
        self.fetch_one(entity_type, id)
    }

    /// Async version of [`commit`](StoreBackend::commit). This is the
    /// single suspension point of an async save.
    async fn commit_async(&self, batch: &[Mutation]) -> StoreResult<()> {
        self.commit(batch)
    }
}

/// Mock backends for testing the layers above the store boundary.
pub mod mock {
    use super::*;
    use crate::error::{ConstraintKind, StoreError};
    use crate::memory::MemoryStore;
    use std::sync::Mutex;

    /// A memory store that records every committed batch, so tests can
    /// assert on accumulation order.
    #[derive(Default)]
    pub struct RecordingStore {
        store: MemoryStore,
        batches: Mutex<Vec<Vec<Mutation>>>,
    }

    impl RecordingStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every batch committed so far, oldest first.
        pub fn batches(&self) -> Vec<Vec<Mutation>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StoreBackend for RecordingStore {
        fn fetch_all(&self, entity_type: &str) -> StoreResult<Vec<Record>> {
            self.store.fetch_all(entity_type)
        }

        fn fetch_one(&self, entity_type: &str, id: &str) -> StoreResult<Option<Record>> {
            self.store.fetch_one(entity_type, id)
        }

        fn commit(&self, batch: &[Mutation]) -> StoreResult<()> {
            self.batches.lock().unwrap().push(batch.to_vec());
            self.store.commit(batch)
        }
    }

    /// What a [`FailingStore`] fails a commit with.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FailureMode {
        /// A foreign-key constraint violation.
        ForeignKey,
        /// A unique constraint violation.
        Unique,
        /// An unclassified driver error.
        Driver,
    }

    /// A store whose commits always fail with a configured error, for
    /// exercising failure translation. Fetches succeed and return nothing.
    pub struct FailingStore {
        mode: FailureMode,
    }

    impl FailingStore {
        pub fn new(mode: FailureMode) -> Self {
            Self { mode }
        }

        fn make_error(&self) -> StoreError {
            match self.mode {
                FailureMode::ForeignKey => StoreError::Constraint {
                    kind: ConstraintKind::ForeignKey,
                    detail: "injected foreign key violation".into(),
                    cause: None,
                },
                FailureMode::Unique => StoreError::Constraint {
                    kind: ConstraintKind::Unique,
                    detail: "injected unique violation".into(),
                    cause: None,
                },
                FailureMode::Driver => StoreError::Database(rusqlite::Error::InvalidQuery),
            }
        }
    }

    #[async_trait]
    impl StoreBackend for FailingStore {
        fn fetch_all(&self, _entity_type: &str) -> StoreResult<Vec<Record>> {
            Ok(Vec::new())
        }

        fn fetch_one(&self, _entity_type: &str, _id: &str) -> StoreResult<Option<Record>> {
            Ok(None)
        }

        fn commit(&self, _batch: &[Mutation]) -> StoreResult<()> {
            Err(self.make_error())
        }
    }
}
