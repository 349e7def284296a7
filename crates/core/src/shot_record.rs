//! Shot records collected from the host timeline.
//!
//! A [`ShotRecord`] is one row of the editorial table: the shot to create,
//! the sequence it belongs to, the tasks to open on it and optional media.
//! Records deserialize from either snake_case keys or the table headers
//! the host panel uses (`"Shot Name"`, `"Task Types"`, ...).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::task_type::{parse_task_types, DEFAULT_TASK_TYPE};

/// Sequence used for records that do not name one.
pub const DEFAULT_SEQUENCE_NAME: &str = "DEFAULT_SEQ";

/// Initial status requested for user tasks when a record names none.
pub const DEFAULT_STATUS: &str = "ready_to_start";

// ---------------------------------------------------------------------------
// Task types
// ---------------------------------------------------------------------------

/// Task types as entered: either a comma-separated string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskTypes {
    List(Vec<String>),
    Csv(String),
}

impl Default for TaskTypes {
    fn default() -> Self {
        Self::List(vec![DEFAULT_TASK_TYPE.to_string()])
    }
}

impl TaskTypes {
    /// Flatten to trimmed, non-empty type names in input order.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::Csv(raw) => parse_task_types(raw),
            Self::List(items) => items
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl From<&str> for TaskTypes {
    fn from(value: &str) -> Self {
        Self::Csv(value.to_string())
    }
}

impl From<Vec<String>> for TaskTypes {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

// ---------------------------------------------------------------------------
// Shot record
// ---------------------------------------------------------------------------

fn default_sequence_name() -> String {
    DEFAULT_SEQUENCE_NAME.to_string()
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

/// One shot to create in the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotRecord {
    #[serde(default = "default_sequence_name", alias = "Sequence")]
    pub sequence_name: String,
    /// Records with an empty name are skipped.
    #[serde(default, alias = "Shot Name")]
    pub shot_name: String,
    #[serde(default, alias = "Task Types")]
    pub task_types: TaskTypes,
    #[serde(default = "default_status", alias = "Status")]
    pub status: String,
    #[serde(default, alias = "Description")]
    pub description: String,
    #[serde(default, alias = "Thumbnail", skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<PathBuf>,
    #[serde(default, alias = "Video", skip_serializing_if = "Option::is_none")]
    pub video_path: Option<PathBuf>,
}

impl ShotRecord {
    /// A record with default task types, status and no media.
    pub fn new(sequence_name: impl Into<String>, shot_name: impl Into<String>) -> Self {
        Self {
            sequence_name: sequence_name.into(),
            shot_name: shot_name.into(),
            task_types: TaskTypes::default(),
            status: default_status(),
            description: String::new(),
            thumbnail_path: None,
            video_path: None,
        }
    }

    pub fn with_task_types(mut self, task_types: impl Into<TaskTypes>) -> Self {
        self.task_types = task_types.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_thumbnail(mut self, path: impl Into<PathBuf>) -> Self {
        self.thumbnail_path = Some(path.into());
        self
    }

    pub fn with_video(mut self, path: impl Into<PathBuf>) -> Self {
        self.video_path = Some(path.into());
        self
    }

    /// Trimmed shot name; empty means the record is skipped.
    pub fn name(&self) -> &str {
        self.shot_name.trim()
    }

    /// Sequence grouping key; blank names fall back to the default sequence.
    pub fn sequence_key(&self) -> &str {
        let name = self.sequence_name.trim();
        if name.is_empty() {
            DEFAULT_SEQUENCE_NAME
        } else {
            name
        }
    }

    /// Requested status, or [`DEFAULT_STATUS`] when blank.
    pub fn requested_status(&self) -> &str {
        let status = self.status.trim();
        if status.is_empty() {
            DEFAULT_STATUS
        } else {
            status
        }
    }

    pub fn task_type_list(&self) -> Vec<String> {
        self.task_types.to_list()
    }

    /// Thumbnail path, only if it points at an existing file.
    pub fn existing_thumbnail(&self) -> Option<&Path> {
        existing_file(self.thumbnail_path.as_deref())
    }

    /// Video path, only if it points at an existing file.
    pub fn existing_video(&self) -> Option<&Path> {
        existing_file(self.video_path.as_deref())
    }
}

fn existing_file(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty() && p.is_file())
}

// ---------------------------------------------------------------------------
// Parsing and grouping
// ---------------------------------------------------------------------------

/// Parse a JSON array of shot records.
pub fn parse_records_json(json: &str) -> Result<Vec<ShotRecord>, CoreError> {
    serde_json::from_str(json)
        .map_err(|e| CoreError::Validation(format!("Invalid shot records: {e}")))
}

/// Group records by sequence, preserving first-seen sequence order and
/// record order within each group.
pub fn group_by_sequence(records: &[ShotRecord]) -> Vec<(String, Vec<&ShotRecord>)> {
    let mut groups: Vec<(String, Vec<&ShotRecord>)> = Vec::new();
    for record in records {
        let key = record.sequence_key();
        match groups.iter_mut().find(|(name, _)| name == key) {
            Some((_, members)) => members.push(record),
            None => groups.push((key.to_string(), vec![record])),
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
