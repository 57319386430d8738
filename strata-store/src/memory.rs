//! Process-local store backend.

use crate::backend::StoreBackend;
use crate::error::{ConstraintKind, StoreError, StoreResult};
use crate::record::{Mutation, Record, Reference};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

type Collections = HashMap<String, BTreeMap<String, Value>>;

/// An in-memory store, useful for tests and prototyping.
///
/// Commits apply to a scratch copy of the state and swap it in only on
/// success, so a failed batch leaves the store untouched. Rows come back
/// sorted by id. Declared [`Reference`] rules are validated against the
/// state a batch produces, like the SQLite backend's deferred checks.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Collections>,
    references: Vec<Reference>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a referential rule enforced on every commit.
    #[must_use]
    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    fn apply(collections: &mut Collections, mutation: &Mutation) -> StoreResult<()> {
        match mutation {
            Mutation::Insert {
                entity_type,
                record,
            } => {
                let rows = collections.entry((*entity_type).to_string()).or_default();
                if rows.contains_key(&record.id) {
                    return Err(StoreError::Constraint {
                        kind: ConstraintKind::Unique,
                        detail: format!("{entity_type} {} already exists", record.id),
                        cause: None,
                    });
                }
                rows.insert(record.id.clone(), record.payload.clone());
            }
            Mutation::Update {
                entity_type,
                record,
            } => {
                collections
                    .entry((*entity_type).to_string())
                    .or_default()
                    .insert(record.id.clone(), record.payload.clone());
            }
            Mutation::Delete { entity_type, id } => {
                if let Some(rows) = collections.get_mut(*entity_type) {
                    rows.remove(id);
                }
            }
        }
        Ok(())
    }

    fn validate_references(collections: &Collections, references: &[Reference]) -> StoreResult<()> {
        for reference in references {
            let Some(children) = collections.get(reference.child_type) else {
                continue;
            };
            let pointer = reference.json_pointer();
            for (child_id, payload) in children {
                let Some(target) = payload.pointer(&pointer).and_then(Value::as_str) else {
                    continue;
                };
                let parent_exists = collections
                    .get(reference.parent_type)
                    .is_some_and(|rows| rows.contains_key(target));
                if !parent_exists {
                    return Err(StoreError::Constraint {
                        kind: ConstraintKind::ForeignKey,
                        detail: format!(
                            "{} {child_id} references missing {} {target}",
                            reference.child_type, reference.parent_type
                        ),
                        cause: None,
                    });
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    fn fetch_all(&self, entity_type: &str) -> StoreResult<Vec<Record>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .get(entity_type)
            .map(|rows| {
                rows.iter()
                    .map(|(id, payload)| Record::new(id.clone(), payload.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn fetch_one(&self, entity_type: &str, id: &str) -> StoreResult<Option<Record>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .get(entity_type)
            .and_then(|rows| rows.get(id))
            .map(|payload| Record::new(id, payload.clone())))
    }

    fn commit(&self, batch: &[Mutation]) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        let mut scratch = state.clone();
        for mutation in batch {
            Self::apply(&mut scratch, mutation)?;
        }
        Self::validate_references(&scratch, &self.references)?;
        *state = scratch;
        Ok(())
    }
}
