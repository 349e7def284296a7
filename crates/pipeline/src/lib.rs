//! Editorial-to-tracker pipeline.
//!
//! Turns a table of [`ShotRecord`](shotbridge_core::shot_record::ShotRecord)s
//! into the tracker hierarchy (sequences, shots, tasks, media) without ever
//! creating duplicates, logs artist time against tasks, publishes review
//! versions and browses projects for a batch parent.

pub mod batch;
pub mod browse;
pub mod error;
pub mod media;
pub mod reconciler;
pub mod review;
pub mod status_resolver;
pub mod task_type_resolver;
pub mod timelog;

pub use batch::{BatchOptions, BatchShotCreator};
pub use browse::{list_projects, project_children, search_projects, ContextChild};
pub use error::{PipelineError, Severity, Step};
pub use media::{MediaUploader, StoreMediaUploader};
pub use reconciler::{reconcile_sequence, reconcile_shot, DryRunLedger, Reconciled, RunMode};
pub use review::{ReviewPublished, ReviewPublisher};
pub use status_resolver::StatusResolver;
pub use task_type_resolver::TaskTypeResolver;
pub use timelog::TimeLogService;
