//! Project and hierarchy browsing, for picking a batch parent.

use shotbridge_core::entity::{Entity, EntityId, EntityKind};
use shotbridge_core::query::Query;
use shotbridge_store::{EntityStore, StoreError};

/// Most projects [`list_projects`] returns.
pub const MAX_PROJECTS: usize = 200;

/// Most projects [`search_projects`] returns.
pub const MAX_SEARCH_RESULTS: usize = 50;

/// Context kinds listed under a project or folder, in display order.
const CHILD_KINDS: &[EntityKind] = &[EntityKind::Folder, EntityKind::Sequence, EntityKind::Shot];

/// A direct child of a project or folder.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextChild {
    pub entity: Entity,
    /// Whether the child can hold further folders, sequences or shots.
    pub expandable: bool,
}

fn sort_by_name(entities: &mut [Entity]) {
    entities.sort_by_key(|e| e.name.to_lowercase());
}

/// Projects sorted by name, case-insensitively.
pub async fn list_projects(store: &dyn EntityStore) -> Result<Vec<Entity>, StoreError> {
    let mut projects = store.query(&Query::new(EntityKind::Project)).await?;
    sort_by_name(&mut projects);
    projects.truncate(MAX_PROJECTS);
    tracing::info!(projects = projects.len(), "Listed projects");
    Ok(projects)
}

/// Projects whose name contains `term`, sorted by name.
///
/// Some trackers refuse `like`; then every project is fetched and filtered
/// here, case-insensitively. Connection-level errors are returned as is.
pub async fn search_projects(store: &dyn EntityStore, term: &str) -> Result<Vec<Entity>, StoreError> {
    let term = term.trim();
    if term.is_empty() {
        return list_projects(store).await;
    }

    let query = Query::new(EntityKind::Project)
        .name_like(&format!("%{term}%"))
        .limit(MAX_SEARCH_RESULTS);
    let mut projects = match store.query(&query).await {
        Ok(found) => found,
        Err(err) if err.is_connection_level() => return Err(err),
        Err(err) => {
            tracing::warn!(error = %err, "Project search with like failed, filtering locally");
            let needle = term.to_lowercase();
            store
                .query(&Query::new(EntityKind::Project))
                .await?
                .into_iter()
                .filter(|p| p.name.to_lowercase().contains(&needle))
                .take(MAX_SEARCH_RESULTS)
                .collect()
        }
    };
    sort_by_name(&mut projects);
    tracing::info!(term, projects = projects.len(), "Searched projects");
    Ok(projects)
}

/// Folders, sequences and shots directly under `parent_id`, each group
/// sorted by name.
pub async fn project_children(
    store: &dyn EntityStore,
    parent_id: &EntityId,
) -> Result<Vec<ContextChild>, StoreError> {
    let mut children = Vec::new();
    for kind in CHILD_KINDS {
        let mut found = store.query(&Query::new(*kind).parent_is(parent_id)).await?;
        sort_by_name(&mut found);
        let expandable = matches!(kind, EntityKind::Folder | EntityKind::Sequence);
        children.extend(found.into_iter().map(|entity| ContextChild { entity, expandable }));
    }
    Ok(children)
}
