use std::fmt;

/// Lifecycle state of an entity inside a unit of work.
///
/// A value not present in the tracked set at all is *detached*; there is
/// no variant for that. Staging operations move entries between the
/// remaining states, and a successful save returns `Added`/`Modified`
/// entries to `Unchanged` while `Deleted` entries leave the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityState {
    /// Tracked and identical to the persisted row as far as the context
    /// knows. Not written on save.
    Unchanged,
    /// Staged for insertion as a new row.
    Added,
    /// Staged for a full-row write on save.
    Modified,
    /// Staged for removal on save.
    Deleted,
}

impl EntityState {
    /// Whether this state contributes a mutation to the next save.
    #[must_use]
    pub fn is_pending(self) -> bool {
        !matches!(self, EntityState::Unchanged)
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityState::Unchanged => "unchanged",
            EntityState::Added => "added",
            EntityState::Modified => "modified",
            EntityState::Deleted => "deleted",
        };
        f.write_str(name)
    }
}
