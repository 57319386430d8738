use crate::error::{RepositoryError, RepositoryResult};
use crate::predicate::Predicate;
use crate::read_only::ReadOnlyRepository;
use strata_context::{Context, ContextError, ContextResult};
use strata_store::ConstraintKind;
use strata_types::Entity;

/// Mutation tier: staging and committing changes to one entity type.
///
/// Built on top of [`ReadOnlyRepository`]; every read operation is
/// available here too. Mutations only stage against the context's tracked
/// set; no store I/O happens until [`save_changes`](Repository::save_changes).
#[derive(Clone)]
pub struct Repository<T: Entity> {
    read: ReadOnlyRepository<T>,
}

impl<T: Entity> Repository<T> {
    /// Binds a repository to a unit of work.
    pub fn new(context: Context) -> Self {
        Self {
            read: ReadOnlyRepository::new(context),
        }
    }

    /// The unit of work this repository is bound to.
    pub fn context(&self) -> &Context {
        self.read.context()
    }

    /// The read tier of this repository.
    pub fn as_read_only(&self) -> &ReadOnlyRepository<T> {
        &self.read
    }

    // ── Read tier (delegated) ───────────────────────────────────

    /// See [`ReadOnlyRepository::get_all`].
    pub fn get_all(&self) -> RepositoryResult<impl Iterator<Item = T> + use<T>> {
        self.read.get_all()
    }

    /// See [`ReadOnlyRepository::find_by`].
    pub fn find_by<'p, P>(
        &self,
        predicate: P,
    ) -> RepositoryResult<impl Iterator<Item = T> + use<'p, T, P>>
    where
        P: Into<Predicate<'p, T>>,
    {
        self.read.find_by(predicate)
    }

    /// See [`ReadOnlyRepository::find_by_async`].
    pub async fn find_by_async<'p>(
        &self,
        predicate: impl Into<Predicate<'p, T>>,
    ) -> RepositoryResult<Vec<T>> {
        self.read.find_by_async(predicate).await
    }

    /// See [`ReadOnlyRepository::find_single`].
    pub fn find_single<'p>(&self, predicate: impl Into<Predicate<'p, T>>) -> RepositoryResult<T> {
        self.read.find_single(predicate)
    }

    /// See [`ReadOnlyRepository::find_single_async`].
    pub async fn find_single_async<'p>(
        &self,
        predicate: impl Into<Predicate<'p, T>>,
    ) -> RepositoryResult<T> {
        self.read.find_single_async(predicate).await
    }

    /// See [`ReadOnlyRepository::reload`].
    pub fn reload(&self, entity: &mut T) -> RepositoryResult<()> {
        self.read.reload(entity)
    }

    /// See [`ReadOnlyRepository::reload_async`].
    pub async fn reload_async(&self, entity: &mut T) -> RepositoryResult<()> {
        self.read.reload_async(entity).await
    }

    // ── Mutation tier ───────────────────────────────────────────

    /// Stages `entity` for insertion as a new row. No store I/O.
    pub fn insert(&self, entity: T) {
        self.context().add(entity);
    }

    /// Stages a full-row write of `entity`, attaching it first if the
    /// context does not track it yet. Every field is persisted as given.
    pub fn update(&self, entity: T) {
        self.context().update(entity);
    }

    /// Stages removal of `entity`'s row, attaching it first if needed.
    pub fn delete(&self, entity: T) {
        self.context().remove(entity);
    }

    /// Commits the pending change set in one round trip.
    ///
    /// A failure classified as a foreign-key violation becomes
    /// [`RepositoryError::ReferentialIntegrity`]; any other failure is
    /// re-raised unchanged.
    pub fn save_changes(&self) -> RepositoryResult<()> {
        translate_save(self.context().save_changes())
    }

    /// Async version of [`save_changes`](Repository::save_changes);
    /// suspends only at the commit round trip.
    pub async fn save_changes_async(&self) -> RepositoryResult<()> {
        translate_save(self.context().save_changes_async().await)
    }
}

/// Save-failure classification shared by both save entry points.
fn translate_save(result: ContextResult<()>) -> RepositoryResult<()> {
    match result {
        Err(ContextError::Store(err))
            if err.constraint_kind() == Some(ConstraintKind::ForeignKey) =>
        {
            Err(RepositoryError::ReferentialIntegrity { cause: err })
        }
        other => Ok(other?),
    }
}
