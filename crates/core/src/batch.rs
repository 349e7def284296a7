//! Batch shot creation: parent selection, progress and the aggregated result.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityKind};

// ---------------------------------------------------------------------------
// Parent
// ---------------------------------------------------------------------------

/// Kind of entity the artist picked as the destination of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentKind {
    Project,
    Folder,
    /// Shots go straight under this sequence; no grouping happens.
    Sequence,
}

impl ParentKind {
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Self::Project => EntityKind::Project,
            Self::Folder => EntityKind::Folder,
            Self::Sequence => EntityKind::Sequence,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Folder => "folder",
            Self::Sequence => "sequence",
        }
    }

    /// Parse a parent kind (case-insensitive). Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "project" => Some(Self::Project),
            "folder" => Some(Self::Folder),
            "sequence" => Some(Self::Sequence),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The destination picked for a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchParent {
    pub kind: ParentKind,
    pub id: EntityId,
}

impl BatchParent {
    pub fn new(kind: ParentKind, id: impl Into<EntityId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress report emitted after each attempted shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based running index across all records.
    pub current: usize,
    pub total: usize,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// The counters of a [`BatchResult`], comparable across runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounters {
    pub sequences_created: usize,
    pub sequences_existed: usize,
    pub shots_created: usize,
    pub shots_existed: usize,
    pub tasks_created: usize,
    pub conform_tasks_created: usize,
    pub thumbnails_uploaded: usize,
    pub versions_created: usize,
}

/// Aggregated outcome of one batch call.
///
/// `errors` and `warnings` are meant to be shown verbatim. A batch is not
/// all-or-nothing: `success` is `true` unless every attempted shot failed
/// or the batch hit a connection-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub success: bool,
    pub dry_run: bool,
    /// Set when the caller stopped the batch between shots.
    pub cancelled: bool,
    pub parent_name: Option<String>,
    pub sequences_created: usize,
    pub sequences_existed: usize,
    pub shots_created: usize,
    pub shots_existed: usize,
    pub tasks_created: usize,
    pub conform_tasks_created: usize,
    pub thumbnails_uploaded: usize,
    pub versions_created: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl BatchResult {
    pub fn new(dry_run: bool) -> Self {
        Self {
            success: true,
            dry_run,
            cancelled: false,
            parent_name: None,
            sequences_created: 0,
            sequences_existed: 0,
            shots_created: 0,
            shots_existed: 0,
            tasks_created: 0,
            conform_tasks_created: 0,
            thumbnails_uploaded: 0,
            versions_created: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// A top-level failure: one error, zero counters.
    pub fn failed(dry_run: bool, error: impl Into<String>) -> Self {
        let mut result = Self::new(dry_run);
        result.success = false;
        result.errors.push(error.into());
        result
    }

    pub fn counters(&self) -> BatchCounters {
        BatchCounters {
            sequences_created: self.sequences_created,
            sequences_existed: self.sequences_existed,
            shots_created: self.shots_created,
            shots_existed: self.shots_existed,
            tasks_created: self.tasks_created,
            conform_tasks_created: self.conform_tasks_created,
            thumbnails_uploaded: self.thumbnails_uploaded,
            versions_created: self.versions_created,
        }
    }

    /// Settle `success` from the error count. Total failure (every
    /// attempted shot errored) is `false`; anything less is `true`.
    pub fn finalize(&mut self, attempted_shots: usize) {
        if !self.errors.is_empty() {
            self.success = self.errors.len() < attempted_shots;
        }
    }

    /// One-line summary for logs and the CLI.
    pub fn summary(&self) -> String {
        format!(
            "[{}] {} sequences ({} existing), {} new shots, {} existing shots, \
             {} conform tasks, {} tasks, {} thumbnails, {} versions, {} errors, {} warnings",
            if self.dry_run { "DRY-RUN" } else { "EXECUTION" },
            self.sequences_created,
            self.sequences_existed,
            self.shots_created,
            self.shots_existed,
            self.conform_tasks_created,
            self.tasks_created,
            self.thumbnails_uploaded,
            self.versions_created,
            self.errors.len(),
            self.warnings.len(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
