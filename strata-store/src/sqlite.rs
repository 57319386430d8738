//! SQLite store backend.
//!
//! Persists every entity as a JSON payload in a single `entities` table
//! keyed by collection name and id. Reference rules are validated with
//! `json_extract` at the end of each commit transaction.

use crate::backend::StoreBackend;
use crate::error::{ConstraintKind, StoreError, StoreResult};
use crate::record::{Mutation, Record, Reference};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, ffi, params};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// A store backed by a SQLite database.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    references: Vec<Reference>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened sqlite store");
        Self::open_with_conn(Arc::new(Mutex::new(conn)))
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open_with_conn(Arc::new(Mutex::new(Connection::open_in_memory()?)))
    }

    /// Builds a store over an existing connection, creating the schema if
    /// needed.
    pub fn open_with_conn(conn: Arc<Mutex<Connection>>) -> StoreResult<Self> {
        let store = Self {
            conn,
            references: Vec::new(),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Declares a referential rule enforced on every commit.
    #[must_use]
    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS entities (
                entity_type TEXT NOT NULL,
                id TEXT NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (entity_type, id)
            );
            ",
        )?;
        Ok(())
    }

    fn apply(tx: &rusqlite::Transaction<'_>, mutation: &Mutation) -> StoreResult<()> {
        match mutation {
            Mutation::Insert {
                entity_type,
                record,
            } => {
                tx.execute(
                    "INSERT INTO entities (entity_type, id, payload) VALUES (?1, ?2, ?3)",
                    params![entity_type, record.id, record.payload.to_string()],
                )
                .map_err(map_driver_error)?;
            }
            Mutation::Update {
                entity_type,
                record,
            } => {
                tx.execute(
                    "INSERT INTO entities (entity_type, id, payload) VALUES (?1, ?2, ?3)
                     ON CONFLICT (entity_type, id) DO UPDATE SET payload = excluded.payload",
                    params![entity_type, record.id, record.payload.to_string()],
                )
                .map_err(map_driver_error)?;
            }
            Mutation::Delete { entity_type, id } => {
                tx.execute(
                    "DELETE FROM entities WHERE entity_type = ?1 AND id = ?2",
                    params![entity_type, id],
                )
                .map_err(map_driver_error)?;
            }
        }
        Ok(())
    }

    /// Deferred check: after the batch is applied, every declared
    /// reference must resolve in the state the transaction produced.
    fn validate_references(tx: &rusqlite::Transaction<'_>, references: &[Reference]) -> StoreResult<()> {
        for reference in references {
            let violation: Option<(String, String)> = tx
                .query_row(
                    "SELECT c.id, json_extract(c.payload, ?2)
                     FROM entities c
                     WHERE c.entity_type = ?1
                       AND json_extract(c.payload, ?2) IS NOT NULL
                       AND NOT EXISTS (
                           SELECT 1 FROM entities p
                           WHERE p.entity_type = ?3
                             AND p.id = json_extract(c.payload, ?2)
                       )
                     LIMIT 1",
                    params![reference.child_type, reference.json_path(), reference.parent_type],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            if let Some((child_id, target)) = violation {
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
        Ok(())
    }
}

#[async_trait]
impl StoreBackend for SqliteStore {
    fn fetch_all(&self, entity_type: &str) -> StoreResult<Vec<Record>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, payload FROM entities WHERE entity_type = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![entity_type], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut records = Vec::new();
        for row in rows {
            let (id, payload) = row?;
            records.push(Record::new(id, serde_json::from_str::<Value>(&payload)?));
        }
        Ok(records)
    }

    fn fetch_one(&self, entity_type: &str, id: &str) -> StoreResult<Option<Record>> {
        let conn = self.conn.lock().unwrap();
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM entities WHERE entity_type = ?1 AND id = ?2",
                params![entity_type, id],
                |row| row.get(0),
            )
            .optional()?;
        match payload {
            Some(payload) => Ok(Some(Record::new(id, serde_json::from_str::<Value>(&payload)?))),
            None => Ok(None),
        }
    }

    fn commit(&self, batch: &[Mutation]) -> StoreResult<()> {
        let mut conn = self.conn.lock().unwrap();
        // Dropping the transaction without committing rolls it back, so
        // any error below leaves the store untouched.
        let tx = conn.transaction()?;
        for mutation in batch {
            Self::apply(&tx, mutation)?;
        }
        Self::validate_references(&tx, &self.references)?;
        tx.commit()?;
        Ok(())
    }
}

/// Maps a driver failure to a structured constraint classification where
/// the extended result code identifies one.
fn map_driver_error(err: rusqlite::Error) -> StoreError {
    let kind = match &err {
        rusqlite::Error::SqliteFailure(code, _) => match code.extended_code {
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(ConstraintKind::ForeignKey),
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                Some(ConstraintKind::Unique)
            }
            ffi::SQLITE_CONSTRAINT_NOTNULL => Some(ConstraintKind::NotNull),
            ffi::SQLITE_CONSTRAINT_CHECK => Some(ConstraintKind::Check),
            _ => None,
        },
        _ => None,
    };
    match kind {
        Some(kind) => StoreError::Constraint {
            kind,
            detail: err.to_string(),
            cause: Some(Box::new(err)),
        },
        None => StoreError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_primary_key_violation_maps_to_unique() {
        let err = rusqlite::Error::SqliteFailure(
            ffi::Error {
                code: ffi::ErrorCode::ConstraintViolation,
                extended_code: ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
            },
            Some("UNIQUE constraint failed: entities.entity_type, entities.id".into()),
        );
        let mapped = map_driver_error(err);
        assert_eq!(mapped.constraint_kind(), Some(ConstraintKind::Unique));
        // the driver error stays inspectable
        assert!(std::error::Error::source(&mapped).is_some());
    }

    #[test]
    fn unrecognized_driver_error_stays_database() {
        let mapped = map_driver_error(rusqlite::Error::InvalidQuery);
        assert!(matches!(mapped, StoreError::Database(_)));
    }
}
