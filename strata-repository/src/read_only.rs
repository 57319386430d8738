use crate::error::{RepositoryError, RepositoryResult};
use crate::predicate::Predicate;
use std::marker::PhantomData;
use strata_context::Context;
use strata_types::Entity;

/// Read tier: querying over one entity type, no mutation surface.
///
/// Every query issues a fresh fetch against the store's committed state:
/// calling [`get_all`](ReadOnlyRepository::get_all) twice observes two
/// snapshots. Predicates are applied in process, lazily over the fetched
/// snapshot.
#[derive(Clone)]
pub struct ReadOnlyRepository<T: Entity> {
    context: Context,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> ReadOnlyRepository<T> {
    /// Binds a read-only repository to a unit of work.
    pub fn new(context: Context) -> Self {
        Self {
            context,
            _entity: PhantomData,
        }
    }

    /// The unit of work this repository is bound to.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Returns the full collection. Each call re-queries the store.
    pub fn get_all(&self) -> RepositoryResult<impl Iterator<Item = T> + use<T>> {
        Ok(self.context.fetch_all::<T>()?.into_iter())
    }

    /// Returns the entities matching `predicate`. One store round trip
    /// per call; the filter runs lazily over the snapshot.
    pub fn find_by<'p, P>(
        &self,
        predicate: P,
    ) -> RepositoryResult<impl Iterator<Item = T> + use<'p, T, P>>
    where
        P: Into<Predicate<'p, T>>,
    {
        let predicate = predicate.into();
        let rows = self.context.fetch_all::<T>()?;
        Ok(rows.into_iter().filter(move |entity| predicate.test(entity)))
    }

    /// Async version of [`find_by`](ReadOnlyRepository::find_by):
    /// suspends at the store round trip and returns the materialized
    /// matches, in the order the store yielded them.
    pub async fn find_by_async<'p>(
        &self,
        predicate: impl Into<Predicate<'p, T>>,
    ) -> RepositoryResult<Vec<T>> {
        let predicate = predicate.into();
        let rows = self.context.fetch_all_async::<T>().await?;
        Ok(rows
            .into_iter()
            .filter(|entity| predicate.test(entity))
            .collect())
    }

    /// Returns the single entity matching `predicate`.
    ///
    /// The candidate set is always fully materialized first: the result
    /// must distinguish zero, one, and more-than-one matches exactly, so
    /// the scan never short-circuits.
    pub fn find_single<'p>(&self, predicate: impl Into<Predicate<'p, T>>) -> RepositoryResult<T> {
        let predicate = predicate.into();
        let matches: Vec<T> = self
            .context
            .fetch_all::<T>()?
            .into_iter()
            .filter(|entity| predicate.test(entity))
            .collect();
        Self::single_from(matches, predicate.label())
    }

    /// Async version of [`find_single`](ReadOnlyRepository::find_single).
    pub async fn find_single_async<'p>(
        &self,
        predicate: impl Into<Predicate<'p, T>>,
    ) -> RepositoryResult<T> {
        let predicate = predicate.into();
        let label = predicate.label().to_owned();
        let matches = self.find_by_async(predicate).await?;
        Self::single_from(matches, &label)
    }

    /// Shared single-result assertion behind both entry points.
    fn single_from(mut matches: Vec<T>, filter: &str) -> RepositoryResult<T> {
        match matches.len() {
            0 => Err(RepositoryError::NotFound {
                entity_type: T::entity_type(),
                filter: filter.to_string(),
            }),
            1 => Ok(matches.remove(0)),
            count => Err(RepositoryError::MultipleFound {
                entity_type: T::entity_type(),
                filter: filter.to_string(),
                count,
            }),
        }
    }

    /// Discards `entity`'s in-memory field values and re-reads them from
    /// the store. The entity must already be tracked by the context.
    pub fn reload(&self, entity: &mut T) -> RepositoryResult<()> {
        Ok(self.context.reload(entity)?)
    }

    /// Async version of [`reload`](ReadOnlyRepository::reload).
    pub async fn reload_async(&self, entity: &mut T) -> RepositoryResult<()> {
        Ok(self.context.reload_async(entity).await?)
    }
}
