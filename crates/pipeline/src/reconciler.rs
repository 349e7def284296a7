//! Find-or-create for hierarchy entities.
//!
//! Every create is preceded by a lookup on `(kind, name, parent)`, so
//! running the same table twice never produces duplicates. Each create is
//! committed on its own; a failure rolls back only that create.
//!
//! A dry run writes nothing, so its planned creates live in a
//! [`DryRunLedger`] for the rest of the batch. A record that repeats a
//! shot or task type then finds the planned entity the way a real run
//! finds the committed one.

use std::collections::{HashMap, HashSet};

use shotbridge_core::entity::{Entity, EntityDraft, EntityId, EntityKind, EntityPatch};
use shotbridge_core::query::Query;
use shotbridge_core::status::{PENDING_REVIEW, PENDING_REVIEW_FALLBACKS};
use shotbridge_core::task_type::{task_name_for_type, CONFORM_TASK_DESCRIPTION, CONFORM_TASK_NAME};
use shotbridge_store::{EntityStore, StoreError};

use crate::error::{severity, Severity, Step};
use crate::status_resolver::StatusResolver;
use crate::task_type_resolver::TaskTypeResolver;

/// Appointment type linking a user to a task.
const ASSIGNMENT_TYPE: &str = "assignment";

/// An entity found or created by [`reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub entity: Entity,
    /// `true` if the entity was already there; nothing was written.
    pub existed: bool,
}

/// Placeholder id for an entity a dry run would have created.
pub fn dry_run_id(kind: EntityKind, name: &str) -> EntityId {
    EntityId::new(format!("dry-run-{}-{}", kind.as_str().to_lowercase(), name))
}

/// Entities a dry run has planned so far, keyed by `(kind, parent, name)`.
#[derive(Debug, Default)]
pub struct DryRunLedger {
    planned: HashMap<(EntityKind, EntityId, String), Entity>,
    ids: HashSet<EntityId>,
}

impl DryRunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, kind: EntityKind, parent_id: &EntityId, name: &str) -> Option<&Entity> {
        self.planned.get(&(kind, parent_id.clone(), name.to_string()))
    }

    /// Record a planned create. Same-named entities under different
    /// parents get `-2`, `-3`, ... appended so placeholder ids stay unique.
    fn plan(&mut self, parent_id: &EntityId, draft: EntityDraft) -> Entity {
        let base = dry_run_id(draft.kind, &draft.name);
        let mut id = base.clone();
        let mut n = 1;
        while self.ids.contains(&id) {
            n += 1;
            id = EntityId::new(format!("{base}-{n}"));
        }
        self.ids.insert(id.clone());

        let key = (draft.kind, parent_id.clone(), draft.name.clone());
        let entity = draft.into_entity(id);
        self.planned.insert(key, entity.clone());
        entity
    }

    pub fn len(&self) -> usize {
        self.planned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planned.is_empty()
    }
}

/// Whether writes happen, and where a dry run keeps its plan.
#[derive(Debug, Default)]
pub enum RunMode {
    #[default]
    Execute,
    DryRun(DryRunLedger),
}

impl RunMode {
    pub fn dry_run() -> Self {
        Self::DryRun(DryRunLedger::new())
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun(_))
    }

    /// Log prefix for this mode.
    pub fn label(&self) -> &'static str {
        if self.is_dry_run() {
            "[DRY-RUN]"
        } else {
            "[EXECUTION]"
        }
    }
}

/// Whether `id` is a dry-run placeholder rather than a real tracker id.
pub fn is_placeholder(id: &EntityId) -> bool {
    id.as_str().starts_with("dry-run-")
}

/// Roll back after a failed write. A failing rollback is logged only.
pub(crate) async fn rollback_quietly(store: &dyn EntityStore) {
    if let Err(err) = store.rollback().await {
        tracing::warn!(error = %err, "Rollback failed");
    }
}

/// Create and commit a draft, rolling back if either step fails.
pub(crate) async fn create_committed(
    store: &dyn EntityStore,
    draft: EntityDraft,
) -> Result<Entity, StoreError> {
    let created = match store.create(draft).await {
        Ok(entity) => entity,
        Err(err) => {
            rollback_quietly(store).await;
            return Err(err);
        }
    };
    if let Err(err) = store.commit().await {
        rollback_quietly(store).await;
        return Err(err);
    }
    Ok(created)
}

/// Find the child of `parent` with the draft's kind and name, or create it.
///
/// In a dry run the lookup still happens; the create is replaced by a
/// placeholder entity recorded in the mode's ledger.
pub async fn reconcile(
    store: &dyn EntityStore,
    parent_id: &EntityId,
    draft: EntityDraft,
    mode: &mut RunMode,
) -> Result<Reconciled, StoreError> {
    if let RunMode::DryRun(ledger) = mode {
        if let Some(entity) = ledger.find(draft.kind, parent_id, &draft.name) {
            return Ok(Reconciled {
                entity: entity.clone(),
                existed: true,
            });
        }
    }

    // A placeholder parent cannot have children on the tracker yet.
    if !is_placeholder(parent_id) {
        let query = Query::new(draft.kind)
            .name_is(&draft.name)
            .parent_is(parent_id);
        if let Some(entity) = store.first(&query).await? {
            return Ok(Reconciled {
                entity,
                existed: true,
            });
        }
    }

    let draft = draft.with_parent(parent_id);
    if let RunMode::DryRun(ledger) = mode {
        return Ok(Reconciled {
            entity: ledger.plan(parent_id, draft),
            existed: false,
        });
    }

    let kind = draft.kind;
    let entity = create_committed(store, draft).await?;
    tracing::info!(kind = %kind, name = %entity.name, id = %entity.id, "Created entity");
    Ok(Reconciled {
        entity,
        existed: false,
    })
}

pub async fn reconcile_sequence(
    store: &dyn EntityStore,
    parent_id: &EntityId,
    name: &str,
    mode: &mut RunMode,
) -> Result<Reconciled, StoreError> {
    reconcile(store, parent_id, EntityDraft::new(EntityKind::Sequence, name), mode).await
}

pub async fn reconcile_shot(
    store: &dyn EntityStore,
    sequence_id: &EntityId,
    name: &str,
    description: &str,
    mode: &mut RunMode,
) -> Result<Reconciled, StoreError> {
    let draft = EntityDraft::new(EntityKind::Shot, name).with_description(description.trim());
    reconcile(store, sequence_id, draft, mode).await
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// A reconciled task plus the non-fatal problems met along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub task: Reconciled,
    pub warnings: Vec<String>,
}

/// Apply a status to a freshly created task. Only fatal errors are
/// returned; anything else becomes a warning.
async fn apply_status(
    store: &dyn EntityStore,
    task: &mut Entity,
    status: &Entity,
    dry_run: bool,
    warnings: &mut Vec<String>,
) -> Result<(), StoreError> {
    if !dry_run {
        let result = match store
            .update(EntityKind::Task, &task.id, EntityPatch::status(status.id.clone()))
            .await
        {
            Ok(()) => store.commit().await,
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            rollback_quietly(store).await;
            if severity(Step::Status, &err) == Severity::Fatal {
                return Err(err);
            }
            warnings.push(format!(
                "Status '{}' not applied to {}: {err}",
                status.name, task.name
            ));
            return Ok(());
        }
    }
    task.status_id = Some(status.id.clone());
    Ok(())
}

/// Find or create the task for `task_type` under `shot` and, if it was
/// created, move it to `status`.
///
/// The task is created without a status first so the tracker applies its
/// workflow default; the requested status is set by a separate update. An
/// existing task is returned untouched.
pub async fn create_task(
    store: &dyn EntityStore,
    types: &mut TaskTypeResolver,
    statuses: &mut StatusResolver,
    shot: &Entity,
    task_type: &str,
    status: &str,
    mode: &mut RunMode,
) -> Result<TaskOutcome, StoreError> {
    let mut warnings = Vec::new();
    let type_id = match types.resolve(store, task_type).await {
        Ok(resolved) => {
            warnings.extend(resolved.warning);
            resolved.entity.map(|t| t.id)
        }
        Err(err) if severity(Step::TaskType, &err) == Severity::Fatal => return Err(err),
        Err(err) => {
            warnings.push(format!("Type of {task_type} task not resolved: {err}"));
            None
        }
    };

    let draft = EntityDraft::new(EntityKind::Task, task_name_for_type(task_type)).with_type(type_id);
    let mut task = reconcile(store, &shot.id, draft, mode).await?;

    if !task.existed {
        let dry_run = mode.is_dry_run();
        match statuses.resolve_entity(store, status).await {
            Some(found) => {
                apply_status(store, &mut task.entity, &found, dry_run, &mut warnings).await?
            }
            None => warnings.push(format!(
                "Status '{status}' not found; {} keeps the default status",
                task.entity.name
            )),
        }
    }

    Ok(TaskOutcome { task, warnings })
}

/// Find or create the conform task of a shot, move it toward pending
/// review and assign it to the acting user.
pub async fn create_conform_task(
    store: &dyn EntityStore,
    types: &mut TaskTypeResolver,
    statuses: &mut StatusResolver,
    shot: &Entity,
    mode: &mut RunMode,
) -> Result<TaskOutcome, StoreError> {
    let mut warnings = Vec::new();
    let type_id = match types.conform_type(store).await {
        Ok(resolved) => {
            warnings.extend(resolved.warning);
            resolved.entity.map(|t| t.id)
        }
        Err(err) if severity(Step::TaskType, &err) == Severity::Fatal => return Err(err),
        Err(err) => {
            warnings.push(format!("Type of conform task not resolved: {err}"));
            None
        }
    };

    let draft = EntityDraft::new(EntityKind::Task, CONFORM_TASK_NAME)
        .with_type(type_id)
        .with_description(CONFORM_TASK_DESCRIPTION);
    let mut task = reconcile(store, &shot.id, draft, mode).await?;

    if !task.existed {
        let dry_run = mode.is_dry_run();
        let mut candidates = vec![PENDING_REVIEW];
        candidates.extend_from_slice(PENDING_REVIEW_FALLBACKS);
        match statuses.resolve_first(store, &candidates).await {
            Some(found) => {
                apply_status(store, &mut task.entity, &found, dry_run, &mut warnings).await?
            }
            None => warnings.push(format!(
                "No review status found for conform task of {}",
                shot.name
            )),
        }

        match assign_acting_user(store, &task.entity.id, dry_run).await {
            Ok(Assignment::UnknownUser) => warnings.push(format!(
                "Conform task of {} not assigned: user '{}' not found",
                shot.name,
                store.api_user()
            )),
            Ok(_) => {}
            Err(err) if severity(Step::Assignment, &err) == Severity::Fatal => return Err(err),
            Err(err) => warnings.push(format!(
                "Conform task of {} not assigned: {err}",
                shot.name
            )),
        }
    }

    Ok(TaskOutcome { task, warnings })
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// Result of [`assign_acting_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    Created,
    AlreadyAssigned,
    /// The session's API user has no tracker user record.
    UnknownUser,
}

/// Assign the session's API user to `task_id` unless already assigned.
///
/// Some trackers reject the appointment `type` attribute; the create is
/// retried once without it.
pub async fn assign_acting_user(
    store: &dyn EntityStore,
    task_id: &EntityId,
    dry_run: bool,
) -> Result<Assignment, StoreError> {
    let user_query = Query::new(EntityKind::User).username_is(store.api_user());
    let Some(user) = store.first(&user_query).await? else {
        return Ok(Assignment::UnknownUser);
    };

    if !is_placeholder(task_id) {
        let existing = Query::new(EntityKind::Appointment)
            .context_is(task_id)
            .resource_is(&user.id);
        if store.first(&existing).await?.is_some() {
            return Ok(Assignment::AlreadyAssigned);
        }
    }
    if dry_run {
        return Ok(Assignment::Created);
    }

    let draft = EntityDraft::new(EntityKind::Appointment, "")
        .with_context(task_id)
        .with_resource(&user.id);
    match create_committed(store, draft.clone().with_appointment_type(ASSIGNMENT_TYPE)).await {
        Ok(_) => {}
        Err(err) if err.is_connection_level() => return Err(err),
        Err(err) => {
            tracing::debug!(error = %err, "Typed appointment rejected, retrying without type");
            create_committed(store, draft).await?;
        }
    }
    tracing::info!(task = %task_id, user = %user.name, "Assigned task");
    Ok(Assignment::Created)
}
