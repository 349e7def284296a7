//! Resolve canonical status names to the spelling a tracker uses.

use std::collections::HashMap;

use shotbridge_core::entity::{Entity, EntityKind};
use shotbridge_core::query::Query;
use shotbridge_core::status::{normalize, statuses_match};
use shotbridge_store::{EntityStore, StoreError};

/// Status lookup with a per-instance cache.
///
/// Both hits and misses are cached under the normalized key, so each
/// distinct status costs at most two queries per resolver lifetime. Store
/// errors are not cached.
#[derive(Debug, Default)]
pub struct StatusResolver {
    /// Normalized key -> literal status name, `None` for a known miss.
    names: HashMap<String, Option<String>>,
    /// Literal status name -> status entity.
    entities: HashMap<String, Entity>,
}

impl StatusResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Literal status name on the tracker for `canonical`, if one exists.
    pub async fn resolve(&mut self, store: &dyn EntityStore, canonical: &str) -> Option<String> {
        self.resolve_entity(store, canonical).await.map(|s| s.name)
    }

    /// Status entity whose name normalizes to the same key as `canonical`.
    pub async fn resolve_entity(
        &mut self,
        store: &dyn EntityStore,
        canonical: &str,
    ) -> Option<Entity> {
        let key = normalize(canonical);
        if key.is_empty() {
            return None;
        }
        if let Some(cached) = self.names.get(&key) {
            return cached.as_ref().and_then(|name| self.entities.get(name)).cloned();
        }

        match lookup(store, canonical).await {
            Ok(Some(status)) => {
                tracing::debug!(requested = canonical, resolved = %status.name, "Resolved status");
                self.names.insert(key, Some(status.name.clone()));
                self.entities.insert(status.name.clone(), status.clone());
                Some(status)
            }
            Ok(None) => {
                tracing::warn!(requested = canonical, "Status not found on tracker");
                self.names.insert(key, None);
                None
            }
            Err(err) => {
                tracing::warn!(requested = canonical, error = %err, "Status lookup failed");
                None
            }
        }
    }

    /// First of `candidates` that resolves, in order.
    pub async fn resolve_first(
        &mut self,
        store: &dyn EntityStore,
        candidates: &[&str],
    ) -> Option<Entity> {
        for candidate in candidates {
            if let Some(status) = self.resolve_entity(store, candidate).await {
                return Some(status);
            }
        }
        None
    }

    /// Number of cached keys, hits and misses together.
    pub fn cached(&self) -> usize {
        self.names.len()
    }

    pub fn clear(&mut self) {
        self.names.clear();
        self.entities.clear();
    }
}

async fn lookup(store: &dyn EntityStore, canonical: &str) -> Result<Option<Entity>, StoreError> {
    let exact = Query::new(EntityKind::Status).name_is(canonical.trim());
    if let Some(status) = store.first(&exact).await? {
        return Ok(Some(status));
    }

    // The query language has no normalized comparison, so a miss scans the
    // whole status table once for this key.
    let all = store.query(&Query::new(EntityKind::Status)).await?;
    Ok(all.into_iter().find(|s| statuses_match(&s.name, canonical)))
}
