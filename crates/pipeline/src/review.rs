//! Publishing a review video against a single task.

use std::path::Path;
use std::sync::Arc;

use shotbridge_core::entity::{Entity, EntityId, EntityKind};
use shotbridge_core::error::CoreError;
use shotbridge_store::EntityStore;

use crate::error::PipelineError;
use crate::media::{MediaUploader, StoreMediaUploader};

/// Kinds a task's parent may have, tried in order.
const PARENT_KINDS: &[EntityKind] = &[
    EntityKind::Shot,
    EntityKind::Sequence,
    EntityKind::Folder,
    EntityKind::Project,
];

/// Outcome of [`ReviewPublisher::publish`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewPublished {
    pub version: Entity,
    pub task: Entity,
    /// The entity the version's asset hangs under, usually the shot.
    pub parent: Entity,
    pub comment: String,
}

/// Publishes review media as new asset versions linked to a task.
pub struct ReviewPublisher {
    store: Arc<dyn EntityStore>,
    uploader: Arc<dyn MediaUploader>,
}

impl ReviewPublisher {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            uploader: Arc::new(StoreMediaUploader),
        }
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn MediaUploader>) -> Self {
        self.uploader = uploader;
        self
    }

    /// Upload `video` as a new version on the asset named after the task's
    /// parent, linked to the task.
    ///
    /// A blank comment is replaced by a timestamped default.
    pub async fn publish(
        &self,
        task_id: &EntityId,
        video: &Path,
        comment: Option<&str>,
    ) -> Result<ReviewPublished, PipelineError> {
        if !video.is_file() {
            return Err(CoreError::Validation(format!(
                "review video not found: {}",
                video.display()
            ))
            .into());
        }

        let store = self.store.as_ref();
        let task = store
            .get(EntityKind::Task, task_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                kind: EntityKind::Task,
                id: task_id.clone(),
            })?;
        let parent = self.task_parent(&task).await?;

        let comment = match comment.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) => c.to_string(),
            None => default_comment(),
        };
        let version = self
            .uploader
            .create_version(store, &parent, Some(&task.id), video, &comment)
            .await?;

        tracing::info!(
            task = %task.name,
            parent = %parent.name,
            version = %version.id,
            "Published review"
        );
        Ok(ReviewPublished {
            version,
            task,
            parent,
            comment,
        })
    }

    async fn task_parent(&self, task: &Entity) -> Result<Entity, PipelineError> {
        let parent_id = task.parent_id.as_ref().ok_or_else(|| {
            CoreError::Validation(format!("task {} has no parent", task.name))
        })?;
        for kind in PARENT_KINDS {
            if let Some(parent) = self.store.get(*kind, parent_id).await? {
                return Ok(parent);
            }
        }
        Err(CoreError::NotFound {
            kind: EntityKind::Shot,
            id: parent_id.clone(),
        }
        .into())
    }
}

fn default_comment() -> String {
    format!("Review publish - {}", chrono::Utc::now().format("%Y-%m-%d %H:%M"))
}
