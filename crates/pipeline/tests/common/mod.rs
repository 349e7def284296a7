//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use shotbridge_core::batch::{BatchParent, BatchResult, ParentKind};
use shotbridge_core::entity::{Entity, EntityKind};
use shotbridge_core::shot_record::ShotRecord;
use shotbridge_pipeline::{BatchOptions, BatchShotCreator};
use shotbridge_store::MemoryStore;

pub const API_USER: &str = "jdoe";

/// A store with the default vocabulary and one project named "Demo".
pub fn new_store() -> (Arc<MemoryStore>, Entity) {
    let store = Arc::new(MemoryStore::with_defaults(API_USER));
    let project = store.seed_project("Demo");
    (store, project)
}

pub fn creator(store: &Arc<MemoryStore>) -> BatchShotCreator {
    BatchShotCreator::new(store.clone())
}

pub fn project_parent(project: &Entity) -> BatchParent {
    BatchParent::new(ParentKind::Project, project.id.clone())
}

/// Run a batch without a progress callback.
pub async fn run(
    creator: &mut BatchShotCreator,
    parent: &BatchParent,
    records: &[ShotRecord],
    options: &BatchOptions,
) -> BatchResult {
    creator
        .create_shots_from_table(parent, records, None, options)
        .await
}

pub fn record(sequence: &str, shot: &str, task_types: &str) -> ShotRecord {
    ShotRecord::new(sequence, shot).with_task_types(task_types)
}

/// Committed entity of `kind` named `name`, if exactly one exists.
pub fn only(store: &MemoryStore, kind: EntityKind, name: &str) -> Entity {
    let mut found: Vec<Entity> = store
        .committed(kind)
        .into_iter()
        .filter(|e| e.name == name)
        .collect();
    assert_eq!(found.len(), 1, "expected one {kind} named {name}");
    found.remove(0)
}

/// Names of committed tasks under `shot`.
pub fn task_names(store: &MemoryStore, shot: &Entity) -> Vec<String> {
    store
        .committed(EntityKind::Task)
        .into_iter()
        .filter(|t| t.parent_id.as_ref() == Some(&shot.id))
        .map(|t| t.name)
        .collect()
}
