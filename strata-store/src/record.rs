//! Wire model crossing the store boundary.

use serde_json::Value;

/// A persisted row: logical id plus the entity payload as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub payload: Value,
}

impl Record {
    pub fn new(id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

/// A single staged change, applied by [`StoreBackend::commit`] in batch
/// order.
///
/// [`StoreBackend::commit`]: crate::StoreBackend::commit
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Insert a new row. Fails with a unique violation if the id exists.
    Insert {
        entity_type: &'static str,
        record: Record,
    },
    /// Full-row write. Creates the row if it does not exist.
    Update {
        entity_type: &'static str,
        record: Record,
    },
    /// Remove a row. Removing an absent row is a no-op.
    Delete { entity_type: &'static str, id: String },
}

impl Mutation {
    /// Collection the mutation targets.
    #[must_use]
    pub fn entity_type(&self) -> &'static str {
        match self {
            Mutation::Insert { entity_type, .. }
            | Mutation::Update { entity_type, .. }
            | Mutation::Delete { entity_type, .. } => entity_type,
        }
    }

    /// Logical id of the targeted row.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Mutation::Insert { record, .. } | Mutation::Update { record, .. } => &record.id,
            Mutation::Delete { id, .. } => id,
        }
    }
}

/// A declared referential rule: a field of every `child_type` payload,
/// when present and non-null, must hold the id of an existing
/// `parent_type` row.
///
/// Validation is deferred to the end of each commit, over the store state
/// the batch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub child_type: &'static str,
    /// Field path inside the child payload, dot-separated for nesting
    /// (`"folder_id"`, `"meta.owner"`).
    pub field: &'static str,
    pub parent_type: &'static str,
}

impl Reference {
    pub fn new(child_type: &'static str, field: &'static str, parent_type: &'static str) -> Self {
        Self {
            child_type,
            field,
            parent_type,
        }
    }

    /// The field as a JSON pointer (`"meta.owner"` → `"/meta/owner"`).
    #[must_use]
    pub fn json_pointer(&self) -> String {
        format!("/{}", self.field.replace('.', "/"))
    }

    /// The field as a SQLite JSON path (`"meta.owner"` → `"$.meta.owner"`).
    #[must_use]
    pub fn json_path(&self) -> String {
        format!("$.{}", self.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mutation_accessors() {
        let m = Mutation::Insert {
            entity_type: "note",
            record: Record::new("n1", json!({"id": "n1"})),
        };
        assert_eq!(m.entity_type(), "note");
        assert_eq!(m.id(), "n1");

        let m = Mutation::Delete {
            entity_type: "note",
            id: "n2".into(),
        };
        assert_eq!(m.id(), "n2");
    }

    #[test]
    fn reference_paths() {
        let r = Reference::new("note", "meta.owner", "user");
        assert_eq!(r.json_pointer(), "/meta/owner");
        assert_eq!(r.json_path(), "$.meta.owner");
    }
}
