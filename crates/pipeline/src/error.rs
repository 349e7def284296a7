//! Pipeline errors and the severity table used by the batch creator.

use shotbridge_core::error::CoreError;
use shotbridge_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The session's API user has no matching tracker user.
    #[error("Tracker user not found: {0}")]
    UnknownUser(String),
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// The batch step an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Preflight,
    Sequence,
    Shot,
    ConformTask,
    Task,
    TaskType,
    Status,
    Assignment,
    Thumbnail,
    Version,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preflight => "preflight",
            Self::Sequence => "sequence",
            Self::Shot => "shot",
            Self::ConformTask => "conform_task",
            Self::Task => "task",
            Self::TaskType => "task_type",
            Self::Status => "status",
            Self::Assignment => "assignment",
            Self::Thumbnail => "thumbnail",
            Self::Version => "version",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far a failure reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Stop the whole batch.
    Fatal,
    /// Skip the rest of the sequence group.
    Group,
    /// Skip the rest of the shot.
    Shot,
    /// Record a warning and carry on.
    Warning,
}

/// Classify an error raised in `step`. Connection-level errors are fatal
/// wherever they happen.
pub fn severity(step: Step, err: &StoreError) -> Severity {
    if err.is_connection_level() {
        return Severity::Fatal;
    }
    match step {
        Step::Preflight => Severity::Fatal,
        Step::Sequence => Severity::Group,
        Step::Shot => Severity::Shot,
        Step::ConformTask
        | Step::Task
        | Step::TaskType
        | Step::Status
        | Step::Assignment
        | Step::Thumbnail
        | Step::Version => Severity::Warning,
    }
}
