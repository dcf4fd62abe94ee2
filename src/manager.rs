use crate::entity::CommunicationEntity;
use crate::errors::EntimapResult;
use crate::query::{DeleteQuery, SelectQuery};

/// The storage seam of the mapping layer.
///
/// A database manager executes the resolved, wire-vocabulary queries this
/// crate produces against some backing store. Implementations interpret the
/// condition trees; the mapping layer never evaluates them itself.
///
/// `insert` and `update` return the stored entity so backends may hand back
/// generated values, identifiers in particular.
pub trait DatabaseManager {
    /// Stores a new entity, returning its stored form.
    fn insert(&mut self, entity: CommunicationEntity) -> EntimapResult<CommunicationEntity>;

    /// Updates an existing entity, returning its stored form.
    fn update(&mut self, entity: CommunicationEntity) -> EntimapResult<CommunicationEntity>;

    /// Deletes the entities matching the query.
    fn delete(&mut self, query: &DeleteQuery) -> EntimapResult<()>;

    /// Returns the entities matching the query, honoring its sorts, skip and
    /// limit.
    fn select(&self, query: &SelectQuery) -> EntimapResult<Vec<CommunicationEntity>>;

    /// Counts the entities matching the query. Backends with a native count
    /// should override this.
    fn count(&self, query: &SelectQuery) -> EntimapResult<u64> {
        Ok(self.select(query)?.len() as u64)
    }

    /// Checks whether any entity matches the query.
    fn exists(&self, query: &SelectQuery) -> EntimapResult<bool> {
        Ok(self.count(query)? > 0)
    }
}
