//! In-process entity store.
//!
//! Mirrors the tracker's session semantics closely enough for the pipeline
//! to run unchanged against it: pending creates are visible to reads in the
//! same session, commit persists them and rollback discards them. Failure
//! injection hooks let tests reject specific names, fail uploads, or drop
//! the connection entirely.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use shotbridge_core::entity::{Entity, EntityDraft, EntityId, EntityKind, EntityPatch};
use shotbridge_core::query::{like_matches, Field, Filter, Query};
use shotbridge_core::task_type::KNOWN_TASK_TYPES;
use uuid::Uuid;

use crate::error::StoreError;
use crate::store::EntityStore;

/// Status names seeded by [`MemoryStore::with_defaults`].
pub const DEFAULT_STATUS_NAMES: &[&str] = &[
    "Not Started",
    "Ready To Start",
    "In Progress",
    "Pending Review",
    "Approved",
    "On Hold",
    "Omitted",
];

/// Asset type names seeded by [`MemoryStore::with_defaults`].
pub const DEFAULT_ASSET_TYPE_NAMES: &[&str] = &["Upload", "Review", "Plate", "Comp"];

#[derive(Default)]
struct State {
    /// Committed entities in insertion order.
    entities: Vec<Entity>,
    pending_creates: Vec<Entity>,
    pending_updates: Vec<(EntityId, EntityPatch)>,
    /// Status given to tasks created without one.
    default_task_status: Option<EntityId>,
    rejected_names: HashSet<String>,
    failing_queries: HashSet<EntityKind>,
    reject_like: bool,
    offline: bool,
    fail_uploads: bool,
    query_log: Vec<String>,
}

impl State {
    /// Session view: committed entities with pending updates applied,
    /// followed by pending creates.
    fn visible(&self) -> Vec<Entity> {
        let mut entities = self.entities.clone();
        for (id, patch) in &self.pending_updates {
            if let Some(entity) = entities.iter_mut().find(|e| &e.id == id) {
                patch.apply_to(entity);
            }
        }
        entities.extend(self.pending_creates.iter().cloned());
        entities
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Connection("tracker unreachable".into()));
        }
        Ok(())
    }
}

/// Thread-safe in-memory [`EntityStore`].
pub struct MemoryStore {
    api_user: String,
    state: Mutex<State>,
}

impl MemoryStore {
    /// An empty store acting as `api_user`. No user entity is seeded.
    pub fn new(api_user: impl Into<String>) -> Self {
        Self {
            api_user: api_user.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// A store seeded with the acting user, common statuses, every known
    /// task type and the upload asset types. New tasks default to
    /// "Not Started".
    pub fn with_defaults(api_user: impl Into<String>) -> Self {
        let store = Self::new(api_user);
        store.seed_user(&store.api_user.clone());
        for name in DEFAULT_STATUS_NAMES {
            store.seed_status(name);
        }
        for name in KNOWN_TASK_TYPES {
            store.seed_type(name);
        }
        for name in DEFAULT_ASSET_TYPE_NAMES {
            store.seed(Entity::new(EntityKind::AssetType, new_id(), *name));
        }
        let not_started = store
            .committed(EntityKind::Status)
            .into_iter()
            .find(|s| s.name == "Not Started")
            .map(|s| s.id);
        store.lock().default_task_status = not_started;
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- seeding ------------------------------------------------------------

    /// Insert an already-committed entity.
    pub fn seed(&self, entity: Entity) -> Entity {
        self.lock().entities.push(entity.clone());
        entity
    }

    pub fn seed_project(&self, name: &str) -> Entity {
        self.seed(Entity::new(EntityKind::Project, new_id(), name))
    }

    pub fn seed_status(&self, name: &str) -> Entity {
        self.seed(Entity::new(EntityKind::Status, new_id(), name))
    }

    pub fn seed_type(&self, name: &str) -> Entity {
        self.seed(Entity::new(EntityKind::Type, new_id(), name))
    }

    /// Seed a user; the username is stored as the entity name.
    pub fn seed_user(&self, username: &str) -> Entity {
        self.seed(Entity::new(EntityKind::User, new_id(), username))
    }

    pub fn seed_child(&self, kind: EntityKind, name: &str, parent: &EntityId) -> Entity {
        let mut entity = Entity::new(kind, new_id(), name);
        entity.parent_id = Some(parent.clone());
        self.seed(entity)
    }

    // -- failure injection --------------------------------------------------

    /// Make every commit that includes a create named `name` fail.
    pub fn reject_creates_named(&self, name: &str) {
        self.lock().rejected_names.insert(name.to_string());
    }

    /// While offline, every operation fails with a connection error.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.lock().fail_uploads = fail;
    }

    /// Make every query against `kind` fail with a rejection.
    pub fn fail_queries_for(&self, kind: EntityKind) {
        self.lock().failing_queries.insert(kind);
    }

    /// Reject queries using `like`, as some tracker versions do.
    pub fn set_reject_like(&self, reject: bool) {
        self.lock().reject_like = reject;
    }

    // -- inspection ---------------------------------------------------------

    /// Committed entities of `kind`.
    pub fn committed(&self, kind: EntityKind) -> Vec<Entity> {
        self.lock()
            .entities
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.lock().entities.iter().filter(|e| e.kind == kind).count()
    }

    pub fn pending_count(&self) -> usize {
        let state = self.lock();
        state.pending_creates.len() + state.pending_updates.len()
    }

    /// Expressions of every query run so far.
    pub fn query_log(&self) -> Vec<String> {
        self.lock().query_log.clone()
    }

    /// Number of queries run against `kind`.
    pub fn queries_for(&self, kind: EntityKind) -> usize {
        let prefix = format!("{} ", kind.as_str());
        self.lock()
            .query_log
            .iter()
            .filter(|q| q.starts_with(&prefix) || q.as_str() == kind.as_str())
            .count()
    }
}

fn new_id() -> EntityId {
    EntityId::new(Uuid::new_v4().to_string())
}

// ---------------------------------------------------------------------------
// Filter evaluation
// ---------------------------------------------------------------------------

fn name_of(all: &[Entity], id: Option<&EntityId>) -> Option<String> {
    let id = id?;
    all.iter().find(|e| &e.id == id).map(|e| e.name.clone())
}

fn field_value(all: &[Entity], entity: &Entity, field: Field) -> Option<String> {
    let id_str = |id: &Option<EntityId>| id.as_ref().map(|i| i.as_str().to_string());
    match field {
        Field::Id => Some(entity.id.as_str().to_string()),
        Field::Name => Some(entity.name.clone()),
        Field::ParentId => id_str(&entity.parent_id),
        Field::ContextId => id_str(&entity.context_id),
        Field::ResourceId => id_str(&entity.resource_id),
        Field::UserId => id_str(&entity.user_id),
        Field::Username => (entity.kind == EntityKind::User).then(|| entity.name.clone()),
        Field::StatusName => name_of(all, entity.status_id.as_ref()),
        Field::TypeName => name_of(all, entity.type_id.as_ref()),
    }
}

fn filter_matches(all: &[Entity], entity: &Entity, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(field, value) => field_value(all, entity, *field).as_deref() == Some(value),
        Filter::Like(field, pattern) => field_value(all, entity, *field)
            .is_some_and(|value| like_matches(pattern, &value)),
        Filter::AssignedTo(user_id) => all.iter().any(|a| {
            a.kind == EntityKind::Appointment
                && a.context_id.as_ref() == Some(&entity.id)
                && a.resource_id.as_ref() == Some(user_id)
        }),
        Filter::StartsAtOrAfter(ts) => entity.start.is_some_and(|start| start >= *ts),
    }
}

// ---------------------------------------------------------------------------
// EntityStore
// ---------------------------------------------------------------------------

#[async_trait]
impl EntityStore for MemoryStore {
    fn api_user(&self) -> &str {
        &self.api_user
    }

    async fn query(&self, query: &Query) -> Result<Vec<Entity>, StoreError> {
        let mut state = self.lock();
        state.check_online()?;
        state.query_log.push(query.expression());
        if state.failing_queries.contains(&query.kind()) {
            return Err(StoreError::Rejected(format!("query refused: {}", query.expression())));
        }
        if state.reject_like && query.filters().iter().any(|f| matches!(f, Filter::Like(..))) {
            return Err(StoreError::Rejected("like is not supported".into()));
        }

        let all = state.visible();
        let found = all
            .iter()
            .filter(|e| e.kind == query.kind())
            .filter(|e| query.filters().iter().all(|f| filter_matches(&all, e, f)))
            .take(query.max_results().unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(found)
    }

    async fn get(&self, kind: EntityKind, id: &EntityId) -> Result<Option<Entity>, StoreError> {
        let state = self.lock();
        state.check_online()?;
        Ok(state
            .visible()
            .into_iter()
            .find(|e| e.kind == kind && &e.id == id))
    }

    async fn create(&self, draft: EntityDraft) -> Result<Entity, StoreError> {
        let mut state = self.lock();
        state.check_online()?;

        let mut entity = draft.into_entity(new_id());
        if entity.kind == EntityKind::Task && entity.status_id.is_none() {
            entity.status_id = state.default_task_status.clone();
        }
        tracing::debug!(kind = %entity.kind, name = %entity.name, id = %entity.id, "Queued create");
        state.pending_creates.push(entity.clone());
        Ok(entity)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        patch: EntityPatch,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.check_online()?;

        if let Some(pending) = state
            .pending_creates
            .iter_mut()
            .find(|e| e.kind == kind && &e.id == id)
        {
            patch.apply_to(pending);
            return Ok(());
        }
        if !state.entities.iter().any(|e| e.kind == kind && &e.id == id) {
            return Err(StoreError::NotFound {
                kind,
                id: id.clone(),
            });
        }
        state.pending_updates.push((id.clone(), patch));
        Ok(())
    }

    async fn upload_component(
        &self,
        path: &Path,
        name: &str,
        version_id: Option<&EntityId>,
    ) -> Result<Entity, StoreError> {
        let mut state = self.lock();
        state.check_online()?;
        if state.fail_uploads {
            return Err(StoreError::Rejected(format!(
                "upload refused for {}",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }

        let mut draft = EntityDraft::new(EntityKind::Component, name);
        if let Some(version_id) = version_id {
            draft = draft.with_version(version_id);
        }
        let entity = draft.into_entity(new_id());
        state.pending_creates.push(entity.clone());
        Ok(entity)
    }

    async fn commit(&self) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.check_online()?;

        if let Some(rejected) = state
            .pending_creates
            .iter()
            .find(|e| state.rejected_names.contains(&e.name))
        {
            return Err(StoreError::Rejected(format!(
                "cannot create {} \"{}\"",
                rejected.kind, rejected.name
            )));
        }

        let updates = std::mem::take(&mut state.pending_updates);
        for (id, patch) in updates {
            if let Some(entity) = state.entities.iter_mut().find(|e| e.id == id) {
                patch.apply_to(entity);
            }
        }
        let creates = std::mem::take(&mut state.pending_creates);
        state.entities.extend(creates);
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.pending_creates.clear();
        state.pending_updates.clear();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn pending_create_visible_in_session_until_rollback() {
        let store = MemoryStore::new("jdoe");
        let project = store.seed_project("Demo");

        store
            .create(EntityDraft::new(EntityKind::Sequence, "SEQ010").with_parent(&project.id))
            .await
            .unwrap();
        let query = Query::new(EntityKind::Sequence).name_is("SEQ010");
        assert_eq!(store.query(&query).await.unwrap().len(), 1);
        assert_eq!(store.count(EntityKind::Sequence), 0);

        store.rollback().await.unwrap();
        assert!(store.query(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_persists_pending_creates() {
        let store = MemoryStore::new("jdoe");
        store
            .create(EntityDraft::new(EntityKind::Project, "Demo"))
            .await
            .unwrap();
        store.commit().await.unwrap();
        assert_eq!(store.count(EntityKind::Project), 1);
        assert_eq!(store.pending_count(), 0);
    }

    #[tokio::test]
    async fn rejected_name_fails_commit_and_keeps_pending() {
        let store = MemoryStore::new("jdoe");
        store.reject_creates_named("SH020");
        store
            .create(EntityDraft::new(EntityKind::Shot, "SH020"))
            .await
            .unwrap();

        assert_matches!(store.commit().await, Err(StoreError::Rejected(_)));
        assert_eq!(store.pending_count(), 1);
        store.rollback().await.unwrap();
        assert_eq!(store.pending_count(), 0);
    }

    #[tokio::test]
    async fn offline_store_fails_with_connection_error() {
        let store = MemoryStore::new("jdoe");
        store.set_offline(true);
        let err = store.query(&Query::new(EntityKind::Project)).await.unwrap_err();
        assert_matches!(err, StoreError::Connection(_));
        assert!(err.is_connection_level());
    }

    #[tokio::test]
    async fn query_matches_name_and_parent() {
        let store = MemoryStore::new("jdoe");
        let project = store.seed_project("Demo");
        let other = store.seed_project("Other");
        let seq = store.seed_child(EntityKind::Sequence, "SEQ010", &project.id);
        store.seed_child(EntityKind::Sequence, "SEQ010", &other.id);

        let found = store
            .query(
                &Query::new(EntityKind::Sequence)
                    .name_is("SEQ010")
                    .parent_is(&project.id),
            )
            .await
            .unwrap();
        assert_eq!(found, vec![seq]);
    }

    #[tokio::test]
    async fn query_joins_status_and_type_names() {
        let store = MemoryStore::with_defaults("jdoe");
        let project = store.seed_project("Demo");
        let created = store
            .create(EntityDraft::new(EntityKind::Task, "comp").with_parent(&project.id))
            .await
            .unwrap();
        store.commit().await.unwrap();

        let by_status = store
            .query(&Query::new(EntityKind::Task).status_name_is("Not Started"))
            .await
            .unwrap();
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].id, created.id);
    }

    #[tokio::test]
    async fn assigned_to_follows_appointments() {
        let store = MemoryStore::with_defaults("jdoe");
        let user = store
            .first(&Query::new(EntityKind::User).username_is("jdoe"))
            .await
            .unwrap()
            .unwrap();
        let project = store.seed_project("Demo");
        let mine = store.seed_child(EntityKind::Task, "comp", &project.id);
        store.seed_child(EntityKind::Task, "roto", &project.id);
        store
            .create(
                EntityDraft::new(EntityKind::Appointment, "")
                    .with_context(&mine.id)
                    .with_resource(&user.id)
                    .with_appointment_type("assignment"),
            )
            .await
            .unwrap();
        store.commit().await.unwrap();

        let found = store
            .query(&Query::new(EntityKind::Task).assigned_to(&user.id))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "comp");
    }

    #[tokio::test]
    async fn like_and_start_filters() {
        let store = MemoryStore::new("jdoe");
        let now = Utc::now();
        for (name, offset) in [("log-a", -2), ("log-b", 0), ("other", 0)] {
            let mut entity = Entity::new(EntityKind::Timelog, new_id(), name);
            entity.start = Some(now + Duration::hours(offset));
            store.seed(entity);
        }
        let found = store
            .query(
                &Query::new(EntityKind::Timelog)
                    .name_like("log%")
                    .starting_from(now - Duration::hours(1)),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "log-b");
    }

    #[tokio::test]
    async fn update_of_unknown_entity_is_not_found() {
        let store = MemoryStore::new("jdoe");
        let err = store
            .update(
                EntityKind::Task,
                &EntityId::new("missing"),
                EntityPatch::default(),
            )
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::NotFound { kind: EntityKind::Task, .. });
    }

    #[tokio::test]
    async fn update_applies_on_commit() {
        let store = MemoryStore::with_defaults("jdoe");
        let project = store.seed_project("Demo");
        let task = store.seed_child(EntityKind::Task, "comp", &project.id);
        let status = store.seed_status("Blocked");

        store
            .update(EntityKind::Task, &task.id, EntityPatch::status(status.id.clone()))
            .await
            .unwrap();
        assert!(store.committed(EntityKind::Task)[0].status_id.is_none());
        store.commit().await.unwrap();
        assert_eq!(store.committed(EntityKind::Task)[0].status_id, Some(status.id));
    }

    #[tokio::test]
    async fn upload_requires_existing_file() {
        let store = MemoryStore::new("jdoe");
        let err = store
            .upload_component(Path::new("/nonexistent/SH010.jpg"), "thumbnail", None)
            .await
            .unwrap_err();
        assert_matches!(err, StoreError::Io(_));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SH010.jpg");
        std::fs::write(&path, b"jpg").unwrap();
        let component = store.upload_component(&path, "thumbnail", None).await.unwrap();
        assert_eq!(component.kind, EntityKind::Component);
    }

    #[tokio::test]
    async fn failing_uploads_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SH010.jpg");
        std::fs::write(&path, b"jpg").unwrap();

        let store = MemoryStore::new("jdoe");
        store.set_fail_uploads(true);
        assert_matches!(
            store.upload_component(&path, "thumbnail", None).await,
            Err(StoreError::Rejected(_))
        );
    }

    #[tokio::test]
    async fn query_log_counts_by_kind() {
        let store = MemoryStore::with_defaults("jdoe");
        store.query(&Query::new(EntityKind::Status)).await.unwrap();
        store
            .query(&Query::new(EntityKind::Status).name_is("Approved"))
            .await
            .unwrap();
        store.query(&Query::new(EntityKind::Type)).await.unwrap();
        assert_eq!(store.queries_for(EntityKind::Status), 2);
        assert_eq!(store.queries_for(EntityKind::Type), 1);
    }

    #[tokio::test]
    async fn injected_query_failures() {
        let store = MemoryStore::with_defaults("jdoe");
        store.fail_queries_for(EntityKind::Type);
        store.set_reject_like(true);

        assert_matches!(
            store.query(&Query::new(EntityKind::Type)).await,
            Err(StoreError::Rejected(_))
        );
        assert_matches!(
            store.query(&Query::new(EntityKind::Project).name_like("%demo%")).await,
            Err(StoreError::Rejected(_))
        );
        assert!(store.query(&Query::new(EntityKind::Project)).await.is_ok());
    }

    #[test]
    fn defaults_seed_vocabulary() {
        let store = MemoryStore::with_defaults("jdoe");
        assert_eq!(store.count(EntityKind::Status), DEFAULT_STATUS_NAMES.len());
        assert_eq!(store.count(EntityKind::Type), KNOWN_TASK_TYPES.len());
        assert_eq!(store.count(EntityKind::User), 1);
    }
}
