//! The [`EntityStore`] trait.

use std::path::Path;

use async_trait::async_trait;
use shotbridge_core::entity::{Entity, EntityDraft, EntityId, EntityKind, EntityPatch};
use shotbridge_core::query::Query;

use crate::error::StoreError;

/// Session-scoped access to tracker entities.
///
/// Creates and updates are pending until [`commit`](Self::commit); other
/// sessions cannot see them before that and [`rollback`](Self::rollback)
/// discards them. Reads are not guaranteed to see pending writes, so commit
/// before querying for something just created. An upload may send queued
/// creates to the server early; they still count as pending and rollback
/// removes them.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Username the session authenticates as.
    fn api_user(&self) -> &str;

    /// Run a query and return every match, in store order.
    async fn query(&self, query: &Query) -> Result<Vec<Entity>, StoreError>;

    /// First match of a query, if any.
    async fn first(&self, query: &Query) -> Result<Option<Entity>, StoreError> {
        let limited = query.clone().limit(1);
        Ok(self.query(&limited).await?.into_iter().next())
    }

    /// Fetch one entity by id. `Ok(None)` when it does not exist.
    async fn get(&self, kind: EntityKind, id: &EntityId) -> Result<Option<Entity>, StoreError>;

    /// Queue a new entity. The returned entity carries its assigned id.
    async fn create(&self, draft: EntityDraft) -> Result<Entity, StoreError>;

    /// Queue an in-place update of an existing entity.
    async fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        patch: EntityPatch,
    ) -> Result<(), StoreError>;

    /// Upload a file as a component, optionally attached to a version.
    async fn upload_component(
        &self,
        path: &Path,
        name: &str,
        version_id: Option<&EntityId>,
    ) -> Result<Entity, StoreError>;

    /// Persist all pending operations.
    async fn commit(&self) -> Result<(), StoreError>;

    /// Discard all pending operations.
    async fn rollback(&self) -> Result<(), StoreError>;
}
