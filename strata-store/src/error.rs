//! Error types for the store boundary.

use std::fmt;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Class of constraint a store rejected a commit for.
///
/// This is the structured classification callers branch on; the upper
/// layers never inspect error message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// A declared reference points at a row that does not exist, or a
    /// still-referenced row was deleted.
    ForeignKey,
    /// A row with the same identity already exists.
    Unique,
    /// A required column was null.
    NotNull,
    /// A check constraint failed.
    Check,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::Unique => "unique",
            ConstraintKind::NotNull => "not null",
            ConstraintKind::Check => "check",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from the SQLite driver.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error on an entity payload.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A commit was rejected by a constraint. The original driver error,
    /// when one exists, stays inspectable through `source()`.
    #[error("{kind} constraint violated: {detail}")]
    Constraint {
        kind: ConstraintKind,
        detail: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    /// The constraint classification of this error, if it is one.
    #[must_use]
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            StoreError::Constraint { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_kind_only_on_constraint_errors() {
        let err = StoreError::Constraint {
            kind: ConstraintKind::ForeignKey,
            detail: "note n1 references missing folder f9".into(),
            cause: None,
        };
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::ForeignKey));

        let err = StoreError::Database(rusqlite::Error::InvalidQuery);
        assert_eq!(err.constraint_kind(), None);
    }

    #[test]
    fn constraint_display_names_the_kind() {
        let err = StoreError::Constraint {
            kind: ConstraintKind::Unique,
            detail: "note n1 already exists".into(),
            cause: None,
        };
        assert!(err.to_string().contains("unique constraint"));
    }
}
