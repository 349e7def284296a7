//! Batch shot creation from an editorial table.
//!
//! [`BatchShotCreator::create_shots_from_table`] walks the records in
//! order, grouped by sequence, and for each shot:
//!
//! 1. finds or creates the shot under its sequence;
//! 2. for new shots only, creates the conform task;
//! 3. creates one task per requested type;
//! 4. uploads the thumbnail and review video when the files exist.
//!
//! Failures are contained by [`severity`]: a failed sequence skips its
//! group, a failed shot skips that shot, everything else becomes a warning.
//! Connection-level failures stop the batch.

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;

use shotbridge_core::batch::{BatchParent, BatchProgress, BatchResult, ParentKind};
use shotbridge_core::entity::Entity;
use shotbridge_core::shot_record::{group_by_sequence, ShotRecord};
use shotbridge_store::{EntityStore, StoreError};
use tokio_util::sync::CancellationToken;

use crate::error::{severity, Severity, Step};
use crate::media::{MediaUploader, StoreMediaUploader};
use crate::reconciler::{
    create_conform_task, create_task, reconcile_sequence, reconcile_shot, RunMode,
};
use crate::status_resolver::StatusResolver;
use crate::task_type_resolver::TaskTypeResolver;

/// Progress callback. Returning [`ControlFlow::Break`] stops the batch
/// after the current shot.
pub type ProgressFn<'a> = dyn FnMut(&BatchProgress) -> ControlFlow<()> + Send + 'a;

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Look up existing entities but write nothing.
    pub dry_run: bool,
    /// Checked between shots.
    pub cancel: Option<CancellationToken>,
}

impl BatchOptions {
    pub fn execute() -> Self {
        Self::default()
    }

    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

/// How a batch run ended early, if it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Cancelled,
    Fatal,
}

/// Creates tracker hierarchy from shot records.
///
/// Holds the status and task-type caches for its lifetime; call
/// [`clear_caches`](Self::clear_caches) after the tracker vocabulary
/// changes.
pub struct BatchShotCreator {
    store: Arc<dyn EntityStore>,
    uploader: Arc<dyn MediaUploader>,
    statuses: StatusResolver,
    types: TaskTypeResolver,
}

impl BatchShotCreator {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            uploader: Arc::new(StoreMediaUploader),
            statuses: StatusResolver::new(),
            types: TaskTypeResolver::new(),
        }
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn MediaUploader>) -> Self {
        self.uploader = uploader;
        self
    }

    pub fn clear_caches(&mut self) {
        self.statuses.clear();
        self.types.clear();
    }

    /// Tracker type names, for autocomplete.
    pub async fn task_type_names(&self) -> Result<Vec<String>, StoreError> {
        self.types.task_type_names(self.store.as_ref()).await
    }

    /// Create sequences, shots, tasks and media for `records` under `parent`.
    ///
    /// Never returns an error: every failure is reported in the result.
    pub async fn create_shots_from_table(
        &mut self,
        parent: &BatchParent,
        records: &[ShotRecord],
        mut progress: Option<&mut ProgressFn<'_>>,
        options: &BatchOptions,
    ) -> BatchResult {
        let dry_run = options.dry_run;
        // One ledger per call: a dry run remembers what it would have created.
        let mut run_mode = if dry_run {
            RunMode::dry_run()
        } else {
            RunMode::Execute
        };
        let mode = run_mode.label();
        let store = Arc::clone(&self.store);

        tracing::info!(
            parent_kind = %parent.kind,
            parent_id = %parent.id,
            records = records.len(),
            "{mode} Starting batch"
        );

        let parent_entity = match store.get(parent.kind.entity_kind(), &parent.id).await {
            Ok(Some(entity)) => entity,
            Ok(None) => {
                tracing::error!(parent_id = %parent.id, "{mode} Parent not found");
                return BatchResult::failed(
                    dry_run,
                    format!("Parent not found: {} {}", parent.kind, parent.id),
                );
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    severity = ?severity(Step::Preflight, &err),
                    "{mode} Pre-flight check failed"
                );
                return BatchResult::failed(
                    dry_run,
                    format!("Cannot load {} {}: {err}", parent.kind, parent.id),
                );
            }
        };

        let mut result = BatchResult::new(dry_run);
        result.parent_name = Some(parent_entity.name.clone());
        if records.is_empty() {
            return result;
        }

        // Shots under a sequence parent go straight into it.
        let groups: Vec<(String, Vec<&ShotRecord>)> = if parent.kind == ParentKind::Sequence {
            vec![(parent_entity.name.clone(), records.iter().collect())]
        } else {
            group_by_sequence(records)
        };

        let total = records.len();
        let mut index = 0;
        let mut attempted = 0;
        let mut stop = None;

        'groups: for (sequence_name, members) in &groups {
            if options.is_cancelled() {
                stop = Some(Stop::Cancelled);
                break;
            }

            let sequence = if parent.kind == ParentKind::Sequence {
                parent_entity.clone()
            } else {
                match reconcile_sequence(store.as_ref(), &parent.id, sequence_name, &mut run_mode).await {
                    Ok(seq) => {
                        if seq.existed {
                            result.sequences_existed += 1;
                        } else {
                            result.sequences_created += 1;
                            tracing::info!(sequence = %sequence_name, "{mode} Created sequence");
                        }
                        seq.entity
                    }
                    Err(err) => {
                        tracing::error!(sequence = %sequence_name, error = %err, "{mode} Sequence failed");
                        result
                            .errors
                            .push(format!("Failed to create sequence {sequence_name}: {err}"));
                        if severity(Step::Sequence, &err) == Severity::Fatal {
                            stop = Some(Stop::Fatal);
                            break;
                        }
                        // The whole group counts as one failed unit.
                        attempted += 1;
                        index += members.len();
                        continue;
                    }
                }
            };

            for record in members {
                if options.is_cancelled() {
                    stop = Some(Stop::Cancelled);
                    break 'groups;
                }

                index += 1;
                let shot_name = record.name();
                if shot_name.is_empty() {
                    tracing::debug!(index, "Skipping record without shot name");
                    continue;
                }
                attempted += 1;

                let message = match self
                    .process_shot(&sequence, sequence_name, record, &mut run_mode, &mut result)
                    .await
                {
                    Ok(message) => message,
                    Err(err) => {
                        tracing::error!(shot = %shot_name, error = %err, "{mode} Shot failed");
                        result.errors.push(format!("{shot_name}: {err}"));
                        if severity(Step::Shot, &err) == Severity::Fatal {
                            stop = Some(Stop::Fatal);
                            break 'groups;
                        }
                        format!("Failed {sequence_name}/{shot_name}")
                    }
                };

                if let Some(callback) = progress.as_deref_mut() {
                    let report = BatchProgress {
                        current: index,
                        total,
                        message,
                    };
                    if callback(&report).is_break() {
                        stop = Some(Stop::Cancelled);
                        break 'groups;
                    }
                }
            }
        }

        match stop {
            Some(Stop::Fatal) => result.success = false,
            Some(Stop::Cancelled) => {
                result.cancelled = true;
                result.finalize(attempted);
            }
            None => result.finalize(attempted),
        }

        if result.cancelled {
            tracing::warn!(processed = index, total, "{mode} Batch cancelled");
        }
        tracing::info!(success = result.success, "{}", result.summary());
        result
    }

    /// Run every step for one shot. Returns the progress message, or the
    /// error that ended the shot (shot-level or fatal).
    async fn process_shot(
        &mut self,
        sequence: &Entity,
        sequence_name: &str,
        record: &ShotRecord,
        run_mode: &mut RunMode,
        result: &mut BatchResult,
    ) -> Result<String, StoreError> {
        let store = Arc::clone(&self.store);
        let store = store.as_ref();
        let shot_name = record.name();
        let dry_run = run_mode.is_dry_run();
        let mode = run_mode.label();

        let shot = reconcile_shot(store, &sequence.id, shot_name, &record.description, run_mode).await?;
        if shot.existed {
            result.shots_existed += 1;
            result
                .warnings
                .push(format!("Shot already existed: {sequence_name}/{shot_name}"));
        } else {
            result.shots_created += 1;
            tracing::info!(shot = %shot_name, sequence = %sequence_name, "{mode} Created shot");

            // Only new shots get a conform task; existing shots keep
            // whatever conform setup they already have.
            match create_conform_task(store, &mut self.types, &mut self.statuses, &shot.entity, run_mode)
                .await
            {
                Ok(outcome) => {
                    if !outcome.task.existed {
                        result.conform_tasks_created += 1;
                    }
                    result.warnings.extend(outcome.warnings);
                }
                Err(err) => absorb(
                    Step::ConformTask,
                    err,
                    |err| format!("Conform task not created: {shot_name}: {err}"),
                    result,
                )?,
            }
        }

        let status = record.requested_status();
        for task_type in record.task_type_list() {
            match create_task(
                store,
                &mut self.types,
                &mut self.statuses,
                &shot.entity,
                &task_type,
                status,
                run_mode,
            )
            .await
            {
                Ok(outcome) => {
                    if !outcome.task.existed {
                        result.tasks_created += 1;
                    }
                    result.warnings.extend(outcome.warnings);
                }
                Err(err) => absorb(
                    Step::Task,
                    err,
                    |err| format!("Task not created: {shot_name}/{task_type}: {err}"),
                    result,
                )?,
            }
        }

        if let Some(path) = record.thumbnail_path.as_deref() {
            match record.existing_thumbnail() {
                Some(path) => {
                    if dry_run {
                        result.thumbnails_uploaded += 1;
                    } else {
                        match self.uploader.upload_thumbnail(store, &shot.entity, path).await {
                            Ok(_) => result.thumbnails_uploaded += 1,
                            Err(err) => absorb(
                                Step::Thumbnail,
                                err,
                                |err| format!("Thumbnail not uploaded: {shot_name}: {err}"),
                                result,
                            )?,
                        }
                    }
                }
                None => result.warnings.push(missing_file("Thumbnail", shot_name, path)),
            }
        }

        if let Some(path) = record.video_path.as_deref() {
            match record.existing_video() {
                Some(path) => {
                    if dry_run {
                        result.versions_created += 1;
                    } else {
                        let comment = version_comment(shot_name);
                        match self
                            .uploader
                            .create_version(store, &shot.entity, None, path, &comment)
                            .await
                        {
                            Ok(_) => result.versions_created += 1,
                            Err(err) => absorb(
                                Step::Version,
                                err,
                                |err| format!("Version not created: {shot_name}: {err}"),
                                result,
                            )?,
                        }
                    }
                }
                None => result.warnings.push(missing_file("Video", shot_name, path)),
            }
        }

        Ok(if shot.existed {
            format!("Found {sequence_name}/{shot_name}")
        } else {
            format!("Created {sequence_name}/{shot_name}")
        })
    }
}

/// Turn a step error into a warning, unless it is fatal.
fn absorb(
    step: Step,
    err: StoreError,
    describe: impl FnOnce(&StoreError) -> String,
    result: &mut BatchResult,
) -> Result<(), StoreError> {
    match severity(step, &err) {
        Severity::Fatal => Err(err),
        _ => {
            tracing::warn!(step = %step, error = %err, "Step failed");
            result.warnings.push(describe(&err));
            Ok(())
        }
    }
}

fn missing_file(label: &str, shot_name: &str, path: &Path) -> String {
    format!("{label} not found for {shot_name}: {}", path.display())
}

fn version_comment(shot_name: &str) -> String {
    format!(
        "Editorial import of {shot_name} - {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M")
    )
}
