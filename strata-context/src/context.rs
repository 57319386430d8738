use crate::error::{ContextError, ContextResult};
use crate::tracker::ChangeTracker;
use std::sync::{Arc, Mutex};
use strata_store::{Record, StoreBackend, StoreError};
use strata_types::{Entity, EntityState};
use tracing::{debug, trace};

/// A unit of work over a store backend.
///
/// Tracks entities, accumulates a pending change set, and commits it in
/// one round trip. Cloning is cheap and yields a handle to the same unit
/// of work. A context is not thread-safe by contract: drive it from one
/// logical operation at a time. The internal lock keeps misuse
/// memory-safe; it does not make concurrent use meaningful, and it is
/// never held across an await point.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    backend: Box<dyn StoreBackend>,
    tracker: Mutex<ChangeTracker>,
}

impl Context {
    /// Opens a unit of work over the given backend.
    pub fn new(backend: impl StoreBackend + 'static) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                backend: Box::new(backend),
                tracker: Mutex::new(ChangeTracker::new()),
            }),
        }
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Fetches every committed row of `T`'s collection. Pending changes,
    /// this context's or any other's, are never reflected.
    pub fn fetch_all<T: Entity>(&self) -> ContextResult<Vec<T>> {
        let records = self.inner.backend.fetch_all(T::entity_type())?;
        decode(records)
    }

    /// Async version of [`fetch_all`](Context::fetch_all); suspends at the
    /// store round trip.
    pub async fn fetch_all_async<T: Entity>(&self) -> ContextResult<Vec<T>> {
        let records = self.inner.backend.fetch_all_async(T::entity_type()).await?;
        decode(records)
    }

    // ── Staging ─────────────────────────────────────────────────

    /// Stages `entity` for insertion. No attach-state check: a fresh
    /// entity is assumed untracked.
    pub fn add<T: Entity>(&self, entity: T) {
        let id = entity.id();
        trace!(entity_type = T::entity_type(), id = %id, "staged insert");
        let mut tracker = self.inner.tracker.lock().unwrap();
        let seq = tracker.next_seq();
        tracker.set_mut::<T>().add(entity, seq);
    }

    /// Tracks `entity` as `Unchanged` if it is not tracked yet; otherwise
    /// overwrites the tracked copy, keeping its state.
    pub fn attach<T: Entity>(&self, entity: T) {
        let mut tracker = self.inner.tracker.lock().unwrap();
        let seq = tracker.next_seq();
        tracker.set_mut::<T>().attach(entity, seq);
    }

    /// Stages a full-row write of `entity`, attaching it first if needed.
    /// Every field is written on save regardless of which ones changed:
    /// the context cannot diff a detached entity against its persisted
    /// state.
    pub fn update<T: Entity>(&self, entity: T) {
        let id = entity.id();
        trace!(entity_type = T::entity_type(), id = %id, "staged update");
        let mut tracker = self.inner.tracker.lock().unwrap();
        let seq = tracker.next_seq();
        tracker.set_mut::<T>().update(entity, seq);
    }

    /// Stages removal of `entity`'s row, attaching it first if needed so
    /// the store knows which row to target. Removing an entity staged as
    /// `Added` detaches it without ever touching the store.
    pub fn remove<T: Entity>(&self, entity: T) {
        let id = entity.id();
        trace!(entity_type = T::entity_type(), id = %id, "staged delete");
        let mut tracker = self.inner.tracker.lock().unwrap();
        let seq = tracker.next_seq();
        tracker.set_mut::<T>().remove(entity, seq);
    }

    /// The tracked state of the entity with this id, or `None` if it is
    /// detached.
    pub fn tracked_state<T: Entity>(&self, id: &str) -> Option<EntityState> {
        let tracker = self.inner.tracker.lock().unwrap();
        tracker.set::<T>().and_then(|set| set.state_of(id))
    }

    /// Whether any tracked entity is staged for the next save.
    pub fn has_changes(&self) -> bool {
        self.inner.tracker.lock().unwrap().has_changes()
    }

    // ── Save ────────────────────────────────────────────────────
    //
    // Sync and async saves share prepare/finalize; the entry points are
    // thin adapters around the commit round trip.

    /// Commits the pending change set in one round trip. On failure the
    /// pending set stays staged; nothing is retried or logged here.
    pub fn save_changes(&self) -> ContextResult<()> {
        let batch = self.prepare_batch()?;
        if batch.is_empty() {
            return Ok(());
        }
        self.inner.backend.commit(&batch)?;
        self.finish_save();
        Ok(())
    }

    /// Async version of [`save_changes`](Context::save_changes); suspends
    /// only at the commit round trip.
    pub async fn save_changes_async(&self) -> ContextResult<()> {
        let batch = self.prepare_batch()?;
        if batch.is_empty() {
            return Ok(());
        }
        self.inner.backend.commit_async(&batch).await?;
        self.finish_save();
        Ok(())
    }

    fn prepare_batch(&self) -> ContextResult<Vec<strata_store::Mutation>> {
        let tracker = self.inner.tracker.lock().unwrap();
        let batch = tracker.batch()?;
        if !batch.is_empty() {
            debug!(mutations = batch.len(), "committing pending change set");
        }
        Ok(batch)
    }

    fn finish_save(&self) {
        self.inner.tracker.lock().unwrap().mark_saved();
    }

    // ── Reload ──────────────────────────────────────────────────

    /// Discards `entity`'s in-memory field values and re-reads them from
    /// the store; the tracked entry resets to `Unchanged`. The entity must
    /// be tracked by this context.
    pub fn reload<T: Entity>(&self, entity: &mut T) -> ContextResult<()> {
        let id = entity.id();
        self.ensure_tracked::<T>(&id)?;
        let record = self.inner.backend.fetch_one(T::entity_type(), &id)?;
        self.apply_reload(entity, id, record)
    }

    /// Async version of [`reload`](Context::reload).
    pub async fn reload_async<T: Entity>(&self, entity: &mut T) -> ContextResult<()> {
        let id = entity.id();
        self.ensure_tracked::<T>(&id)?;
        let record = self
            .inner
            .backend
            .fetch_one_async(T::entity_type(), &id)
            .await?;
        self.apply_reload(entity, id, record)
    }

    fn ensure_tracked<T: Entity>(&self, id: &str) -> ContextResult<()> {
        if self.tracked_state::<T>(id).is_none() {
            return Err(ContextError::NotTracked {
                entity_type: T::entity_type(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn apply_reload<T: Entity>(
        &self,
        entity: &mut T,
        id: String,
        record: Option<Record>,
    ) -> ContextResult<()> {
        let record = record.ok_or_else(|| ContextError::Missing {
            entity_type: T::entity_type(),
            id: id.clone(),
        })?;
        let fresh: T = serde_json::from_value(record.payload).map_err(StoreError::from)?;
        {
            let mut tracker = self.inner.tracker.lock().unwrap();
            tracker.set_mut::<T>().refresh(&id, fresh.clone());
        }
        *entity = fresh;
        Ok(())
    }
}

fn decode<T: Entity>(records: Vec<Record>) -> ContextResult<Vec<T>> {
    let mut entities = Vec::with_capacity(records.len());
    for record in records {
        entities.push(serde_json::from_value(record.payload).map_err(StoreError::from)?);
    }
    Ok(entities)
}
