//! Thumbnail and review-version publishing.

use std::path::Path;

use async_trait::async_trait;
use shotbridge_core::entity::{Entity, EntityDraft, EntityId, EntityKind, EntityPatch};
use shotbridge_core::query::Query;
use shotbridge_store::{EntityStore, StoreError};

use crate::reconciler::{create_committed, rollback_quietly};

/// Asset types a review version may be filed under, in preference order.
pub const VERSION_ASSET_TYPES: &[&str] = &["Upload", "Review", "Plate", "Comp"];

/// Component name of the uploaded review media.
pub const MAIN_COMPONENT: &str = "main";

const THUMBNAIL_COMPONENT: &str = "thumbnail";

/// Publishes media files against tracker entities.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Upload `path` and set it as the thumbnail of `entity`. Returns the
    /// component id.
    async fn upload_thumbnail(
        &self,
        store: &dyn EntityStore,
        entity: &Entity,
        path: &Path,
    ) -> Result<EntityId, StoreError>;

    /// Publish `path` as a new asset version under `shot`, linked to
    /// `task`, or to the shot's first task when none is given.
    async fn create_version(
        &self,
        store: &dyn EntityStore,
        shot: &Entity,
        task: Option<&EntityId>,
        path: &Path,
        comment: &str,
    ) -> Result<Entity, StoreError>;
}

/// [`MediaUploader`] that goes through the store's component upload.
#[derive(Debug, Default, Clone, Copy)]
pub struct StoreMediaUploader;

impl StoreMediaUploader {
    async fn asset_type(store: &dyn EntityStore) -> Result<Entity, StoreError> {
        for name in VERSION_ASSET_TYPES {
            let query = Query::new(EntityKind::AssetType).name_is(name);
            if let Some(found) = store.first(&query).await? {
                return Ok(found);
            }
        }
        Err(StoreError::Rejected(format!(
            "no asset type available (tried {})",
            VERSION_ASSET_TYPES.join(", ")
        )))
    }

    /// The asset named after the shot, created on first publish.
    async fn shot_asset(store: &dyn EntityStore, shot: &Entity) -> Result<Entity, StoreError> {
        let query = Query::new(EntityKind::Asset)
            .name_is(&shot.name)
            .parent_is(&shot.id);
        if let Some(asset) = store.first(&query).await? {
            return Ok(asset);
        }
        let asset_type = Self::asset_type(store).await?;
        let draft = EntityDraft::new(EntityKind::Asset, &shot.name)
            .with_parent(&shot.id)
            .with_type(Some(asset_type.id));
        create_committed(store, draft).await
    }

    async fn publish(
        store: &dyn EntityStore,
        shot: &Entity,
        task: Option<&EntityId>,
        path: &Path,
        comment: &str,
    ) -> Result<Entity, StoreError> {
        let asset = Self::shot_asset(store, shot).await?;
        let task = match task {
            Some(id) => Some(id.clone()),
            None => store
                .first(&Query::new(EntityKind::Task).parent_is(&shot.id))
                .await?
                .map(|t| t.id),
        };

        let version = store
            .create(
                EntityDraft::new(EntityKind::AssetVersion, "")
                    .with_asset(&asset.id)
                    .with_task(task)
                    .with_comment(comment),
            )
            .await?;
        store
            .upload_component(path, MAIN_COMPONENT, Some(&version.id))
            .await?;
        store.commit().await?;
        Ok(version)
    }
}

#[async_trait]
impl MediaUploader for StoreMediaUploader {
    async fn upload_thumbnail(
        &self,
        store: &dyn EntityStore,
        entity: &Entity,
        path: &Path,
    ) -> Result<EntityId, StoreError> {
        let result = async {
            let component = store.upload_component(path, THUMBNAIL_COMPONENT, None).await?;
            store
                .update(entity.kind, &entity.id, EntityPatch::thumbnail(component.id.clone()))
                .await?;
            store.commit().await?;
            Ok::<_, StoreError>(component.id)
        }
        .await;

        if result.is_err() {
            rollback_quietly(store).await;
        }
        result
    }

    async fn create_version(
        &self,
        store: &dyn EntityStore,
        shot: &Entity,
        task: Option<&EntityId>,
        path: &Path,
        comment: &str,
    ) -> Result<Entity, StoreError> {
        let result = Self::publish(store, shot, task, path, comment).await;
        match &result {
            Ok(version) => {
                tracing::info!(shot = %shot.name, version = %version.id, "Published review version")
            }
            Err(_) => rollback_quietly(store).await,
        }
        result
    }
}
