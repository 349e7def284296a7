//! Typed tracker entities.
//!
//! The tracker exposes loosely-typed records; this module gives them a
//! fixed shape. [`Entity`] is what the store returns, [`EntityDraft`] is
//! what callers hand to `create`, and [`EntityPatch`] carries the few
//! fields this tool ever updates in place.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Opaque, store-assigned entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Entity kind
// ---------------------------------------------------------------------------

/// Discriminator for every tracker entity type this tool touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Project,
    Folder,
    Sequence,
    Shot,
    Task,
    Status,
    Type,
    User,
    Appointment,
    Asset,
    AssetType,
    AssetVersion,
    Component,
    Timelog,
}

impl EntityKind {
    /// The entity type name used by the tracker schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::Folder => "Folder",
            Self::Sequence => "Sequence",
            Self::Shot => "Shot",
            Self::Task => "Task",
            Self::Status => "Status",
            Self::Type => "Type",
            Self::User => "User",
            Self::Appointment => "Appointment",
            Self::Asset => "Asset",
            Self::AssetType => "AssetType",
            Self::AssetVersion => "AssetVersion",
            Self::Component => "FileComponent",
            Self::Timelog => "Timelog",
        }
    }

    /// Parse a tracker entity type name. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Project" => Some(Self::Project),
            "Folder" => Some(Self::Folder),
            "Sequence" => Some(Self::Sequence),
            "Shot" => Some(Self::Shot),
            "Task" => Some(Self::Task),
            "Status" => Some(Self::Status),
            "Type" => Some(Self::Type),
            "User" => Some(Self::User),
            "Appointment" => Some(Self::Appointment),
            "Asset" => Some(Self::Asset),
            "AssetType" => Some(Self::AssetType),
            "AssetVersion" => Some(Self::AssetVersion),
            "FileComponent" | "Component" => Some(Self::Component),
            "Timelog" => Some(Self::Timelog),
            _ => None,
        }
    }

    /// Whether entities of this kind live in the project hierarchy and can
    /// therefore parent other context entities.
    pub fn is_context(&self) -> bool {
        matches!(
            self,
            Self::Project | Self::Folder | Self::Sequence | Self::Shot | Self::Task
        )
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A tracker entity with every field this tool reads.
///
/// Fields that do not apply to a kind stay `None`. References to other
/// entities are held by id only; the child never owns its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Task type (tasks) or asset type (assets).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<EntityId>,
    /// Context the record is attached to (appointments, timelogs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<EntityId>,
    /// Assigned resource (appointments).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<EntityId>,
    /// Owning user (timelogs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<EntityId>,
    /// Owning version (components).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Entity {
    /// Create an entity with only the identifying fields set.
    pub fn new(kind: EntityKind, id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            parent_id: None,
            description: None,
            type_id: None,
            status_id: None,
            context_id: None,
            resource_id: None,
            user_id: None,
            asset_id: None,
            task_id: None,
            version_id: None,
            thumbnail_id: None,
            appointment_type: None,
            duration_secs: None,
            start: None,
            comment: None,
        }
    }

    pub fn reference(&self) -> EntityRef {
        EntityRef {
            kind: self.kind,
            id: self.id.clone(),
        }
    }
}

/// A typed pointer to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<EntityId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// Fields for a new entity. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDraft {
    pub kind: EntityKind,
    pub name: String,
    pub parent_id: Option<EntityId>,
    pub description: Option<String>,
    pub type_id: Option<EntityId>,
    pub status_id: Option<EntityId>,
    pub context_id: Option<EntityId>,
    pub resource_id: Option<EntityId>,
    pub user_id: Option<EntityId>,
    pub asset_id: Option<EntityId>,
    pub task_id: Option<EntityId>,
    pub version_id: Option<EntityId>,
    pub appointment_type: Option<String>,
    pub duration_secs: Option<i64>,
    pub start: Option<Timestamp>,
    pub comment: Option<String>,
}

impl EntityDraft {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            parent_id: None,
            description: None,
            type_id: None,
            status_id: None,
            context_id: None,
            resource_id: None,
            user_id: None,
            asset_id: None,
            task_id: None,
            version_id: None,
            appointment_type: None,
            duration_secs: None,
            start: None,
            comment: None,
        }
    }

    pub fn with_parent(mut self, parent_id: &EntityId) -> Self {
        self.parent_id = Some(parent_id.clone());
        self
    }

    /// Set the description. Empty strings are ignored.
    pub fn with_description(mut self, description: &str) -> Self {
        if !description.is_empty() {
            self.description = Some(description.to_string());
        }
        self
    }

    pub fn with_type(mut self, type_id: Option<EntityId>) -> Self {
        self.type_id = type_id;
        self
    }

    pub fn with_status(mut self, status_id: Option<EntityId>) -> Self {
        self.status_id = status_id;
        self
    }

    pub fn with_context(mut self, context_id: &EntityId) -> Self {
        self.context_id = Some(context_id.clone());
        self
    }

    pub fn with_resource(mut self, resource_id: &EntityId) -> Self {
        self.resource_id = Some(resource_id.clone());
        self
    }

    pub fn with_user(mut self, user_id: &EntityId) -> Self {
        self.user_id = Some(user_id.clone());
        self
    }

    pub fn with_asset(mut self, asset_id: &EntityId) -> Self {
        self.asset_id = Some(asset_id.clone());
        self
    }

    pub fn with_task(mut self, task_id: Option<EntityId>) -> Self {
        self.task_id = task_id;
        self
    }

    pub fn with_version(mut self, version_id: &EntityId) -> Self {
        self.version_id = Some(version_id.clone());
        self
    }

    pub fn with_appointment_type(mut self, appointment_type: &str) -> Self {
        self.appointment_type = Some(appointment_type.to_string());
        self
    }

    pub fn with_duration_secs(mut self, secs: i64) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    pub fn with_start(mut self, start: Timestamp) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    /// Materialize the draft under a store-assigned id.
    pub fn into_entity(self, id: EntityId) -> Entity {
        Entity {
            id,
            kind: self.kind,
            name: self.name,
            parent_id: self.parent_id,
            description: self.description,
            type_id: self.type_id,
            status_id: self.status_id,
            context_id: self.context_id,
            resource_id: self.resource_id,
            user_id: self.user_id,
            asset_id: self.asset_id,
            task_id: self.task_id,
            version_id: self.version_id,
            thumbnail_id: None,
            appointment_type: self.appointment_type,
            duration_secs: self.duration_secs,
            start: self.start,
            comment: self.comment,
        }
    }
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// In-place update. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPatch {
    pub status_id: Option<EntityId>,
    pub thumbnail_id: Option<EntityId>,
    pub description: Option<String>,
}

impl EntityPatch {
    pub fn status(status_id: EntityId) -> Self {
        Self {
            status_id: Some(status_id),
            ..Self::default()
        }
    }

    pub fn thumbnail(thumbnail_id: EntityId) -> Self {
        Self {
            thumbnail_id: Some(thumbnail_id),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status_id.is_none() && self.thumbnail_id.is_none() && self.description.is_none()
    }

    pub fn apply_to(&self, entity: &mut Entity) {
        if let Some(status_id) = &self.status_id {
            entity.status_id = Some(status_id.clone());
        }
        if let Some(thumbnail_id) = &self.thumbnail_id {
            entity.thumbnail_id = Some(thumbnail_id.clone());
        }
        if let Some(description) = &self.description {
            entity.description = Some(description.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
