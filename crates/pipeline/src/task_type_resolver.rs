//! Resolve task-type names from the editorial table to tracker types.

use std::collections::HashMap;

use shotbridge_core::entity::{Entity, EntityKind};
use shotbridge_core::query::Query;
use shotbridge_core::task_type::{canonical_type_name, CONFORM_TYPE_CANDIDATES, DEFAULT_TASK_TYPE};
use shotbridge_store::{EntityStore, StoreError};

/// Outcome of a type lookup. A missing type is not an error: the task is
/// still created, with a fallback type or none, and the warning explains.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedType {
    pub entity: Option<Entity>,
    pub warning: Option<String>,
}

impl ResolvedType {
    fn found(entity: Entity) -> Self {
        Self {
            entity: Some(entity),
            warning: None,
        }
    }
}

/// Task-type lookup with a per-instance cache keyed by mapped name.
#[derive(Debug, Default)]
pub struct TaskTypeResolver {
    cache: HashMap<String, Option<Entity>>,
}

impl TaskTypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lookup(
        &mut self,
        store: &dyn EntityStore,
        name: &str,
    ) -> Result<Option<Entity>, StoreError> {
        if let Some(cached) = self.cache.get(name) {
            return Ok(cached.clone());
        }
        let found = store
            .first(&Query::new(EntityKind::Type).name_is(name))
            .await?;
        self.cache.insert(name.to_string(), found.clone());
        Ok(found)
    }

    /// Resolve `requested` through the alias map, falling back to the
    /// default type when it does not exist.
    pub async fn resolve(
        &mut self,
        store: &dyn EntityStore,
        requested: &str,
    ) -> Result<ResolvedType, StoreError> {
        let mapped = canonical_type_name(requested);
        if let Some(entity) = self.lookup(store, &mapped).await? {
            return Ok(ResolvedType::found(entity));
        }

        match self.lookup(store, DEFAULT_TASK_TYPE).await? {
            Some(fallback) => {
                tracing::warn!(requested, fallback = DEFAULT_TASK_TYPE, "Task type not found");
                Ok(ResolvedType {
                    entity: Some(fallback),
                    warning: Some(format!(
                        "Task type '{requested}' not found, using '{DEFAULT_TASK_TYPE}'"
                    )),
                })
            }
            None => {
                tracing::warn!(requested, "Task type and fallback not found");
                Ok(ResolvedType {
                    entity: None,
                    warning: Some(format!(
                        "Task type '{requested}' not found and no '{DEFAULT_TASK_TYPE}' fallback exists"
                    )),
                })
            }
        }
    }

    /// Type for conform tasks: the first existing spelling of "Conform",
    /// else whatever type the tracker lists first.
    pub async fn conform_type(&mut self, store: &dyn EntityStore) -> Result<ResolvedType, StoreError> {
        for candidate in CONFORM_TYPE_CANDIDATES {
            if let Some(entity) = self.lookup(store, candidate).await? {
                return Ok(ResolvedType::found(entity));
            }
        }

        match store.first(&Query::new(EntityKind::Type)).await? {
            Some(any) => {
                tracing::warn!(fallback = %any.name, "No conform task type, using first available");
                let warning = format!("No conform task type found, using '{}'", any.name);
                Ok(ResolvedType {
                    entity: Some(any),
                    warning: Some(warning),
                })
            }
            None => Ok(ResolvedType {
                entity: None,
                warning: Some("No task types exist; conform task created without type".into()),
            }),
        }
    }

    /// Every type name on the tracker, for autocomplete.
    pub async fn task_type_names(&self, store: &dyn EntityStore) -> Result<Vec<String>, StoreError> {
        let types = store.query(&Query::new(EntityKind::Type)).await?;
        Ok(types.into_iter().map(|t| t.name).collect())
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
