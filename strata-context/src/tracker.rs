//! Tracked-entity sets and the pending change set.
//!
//! One [`EntitySet`] exists per entity type, type-erased behind [`AnySet`]
//! so the tracker can hold them all in one map. Entries carry a
//! context-global staging sequence number; the commit batch is ordered by
//! it, so mutations reach the store in the order they were accumulated,
//! across types.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use strata_store::{Mutation, Record, StoreError};
use strata_types::{Entity, EntityState};

struct Tracked<T> {
    entity: T,
    state: EntityState,
    seq: u64,
}

pub(crate) struct EntitySet<T: Entity> {
    entries: HashMap<String, Tracked<T>>,
}

impl<T: Entity> EntitySet<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Blind insert: a fresh entity is assumed untracked. A colliding
    /// tracked id is replaced; the conflict, if real, is the store's to
    /// report at save time.
    pub fn add(&mut self, entity: T, seq: u64) {
        let id = entity.id();
        self.entries.insert(
            id,
            Tracked {
                entity,
                state: EntityState::Added,
                seq,
            },
        );
    }

    /// Tracks the value as `Unchanged` if absent; otherwise overwrites the
    /// tracked copy and keeps the current state.
    pub fn attach(&mut self, entity: T, seq: u64) {
        match self.entries.entry(entity.id()) {
            Entry::Occupied(mut slot) => {
                slot.get_mut().entity = entity;
            }
            Entry::Vacant(slot) => {
                slot.insert(Tracked {
                    entity,
                    state: EntityState::Unchanged,
                    seq,
                });
            }
        }
    }

    /// Attach-if-needed, overwrite the tracked copy, mark `Modified`.
    /// An `Added` entry stays `Added`: the row has never been persisted,
    /// so there is nothing to update yet.
    pub fn update(&mut self, entity: T, seq: u64) {
        match self.entries.entry(entity.id()) {
            Entry::Occupied(mut slot) => {
                let tracked = slot.get_mut();
                tracked.entity = entity;
                if tracked.state == EntityState::Unchanged {
                    tracked.seq = seq;
                }
                if tracked.state != EntityState::Added {
                    tracked.state = EntityState::Modified;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(Tracked {
                    entity,
                    state: EntityState::Modified,
                    seq,
                });
            }
        }
    }

    /// Attach-if-needed, then mark `Deleted`. Removing an `Added` entry
    /// detaches it entirely: the row was never persisted, so nothing must
    /// reach the store.
    pub fn remove(&mut self, entity: T, seq: u64) {
        match self.entries.entry(entity.id()) {
            Entry::Occupied(mut slot) => {
                if slot.get().state == EntityState::Added {
                    slot.remove();
                } else {
                    let tracked = slot.get_mut();
                    if tracked.state == EntityState::Unchanged {
                        tracked.seq = seq;
                    }
                    tracked.state = EntityState::Deleted;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(Tracked {
                    entity,
                    state: EntityState::Deleted,
                    seq,
                });
            }
        }
    }

    /// Overwrites the tracked copy with store state (reload path).
    pub fn refresh(&mut self, id: &str, entity: T) {
        if let Some(tracked) = self.entries.get_mut(id) {
            tracked.entity = entity;
            tracked.state = EntityState::Unchanged;
        }
    }

    pub fn state_of(&self, id: &str) -> Option<EntityState> {
        self.entries.get(id).map(|tracked| tracked.state)
    }
}

/// Type-erased view of an [`EntitySet`], held by the tracker.
pub(crate) trait AnySet: Send {
    fn pending_mutations(&self) -> Result<Vec<(u64, Mutation)>, StoreError>;
    fn mark_saved(&mut self);
    fn has_pending(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Entity> AnySet for EntitySet<T> {
    fn pending_mutations(&self) -> Result<Vec<(u64, Mutation)>, StoreError> {
        let mut staged = Vec::new();
        for tracked in self.entries.values() {
            let mutation = match tracked.state {
                EntityState::Unchanged => continue,
                EntityState::Added => Mutation::Insert {
                    entity_type: T::entity_type(),
                    record: Record::new(tracked.entity.id(), serde_json::to_value(&tracked.entity)?),
                },
                EntityState::Modified => Mutation::Update {
                    entity_type: T::entity_type(),
                    record: Record::new(tracked.entity.id(), serde_json::to_value(&tracked.entity)?),
                },
                EntityState::Deleted => Mutation::Delete {
                    entity_type: T::entity_type(),
                    id: tracked.entity.id(),
                },
            };
            staged.push((tracked.seq, mutation));
        }
        Ok(staged)
    }

    fn mark_saved(&mut self) {
        self.entries
            .retain(|_, tracked| tracked.state != EntityState::Deleted);
        for tracked in self.entries.values_mut() {
            tracked.state = EntityState::Unchanged;
        }
    }

    fn has_pending(&self) -> bool {
        self.entries.values().any(|tracked| tracked.state.is_pending())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// All tracked sets of one context, plus the staging counter.
pub(crate) struct ChangeTracker {
    sets: HashMap<TypeId, Box<dyn AnySet>>,
    next_seq: u64,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self {
            sets: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    pub fn set_mut<T: Entity>(&mut self) -> &mut EntitySet<T> {
        self.sets
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(EntitySet::<T>::new()))
            .as_any_mut()
            .downcast_mut::<EntitySet<T>>()
            .expect("tracked sets are keyed by TypeId")
    }

    pub fn set<T: Entity>(&self) -> Option<&EntitySet<T>> {
        self.sets
            .get(&TypeId::of::<T>())
            .and_then(|set| set.as_any().downcast_ref::<EntitySet<T>>())
    }

    /// The pending change set, in accumulation order across all types.
    pub fn batch(&self) -> Result<Vec<Mutation>, StoreError> {
        let mut staged = Vec::new();
        for set in self.sets.values() {
            staged.extend(set.pending_mutations()?);
        }
        staged.sort_by_key(|(seq, _)| *seq);
        Ok(staged.into_iter().map(|(_, mutation)| mutation).collect())
    }

    pub fn mark_saved(&mut self) {
        for set in self.sets.values_mut() {
            set.mark_saved();
        }
    }

    pub fn has_changes(&self) -> bool {
        self.sets.values().any(|set| set.has_pending())
    }
}
