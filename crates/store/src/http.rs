//! HTTP client for the tracker JSON API.
//!
//! Every call is a `POST {server}/api` whose body is a JSON array of
//! operations; the response is an array with one result per operation.
//! Creates and updates are queued client-side and flushed in one request
//! on [`commit`](EntityStore::commit). Entity ids are generated here
//! (UUID v4), so a queued create can be referenced by later operations
//! before it reaches the server. Queries never flush the queue.
//!
//! An upload is the one place queued creates leave early: the server must
//! hold the component before it hands out an upload URL. Those creates are
//! remembered and deleted again if the session rolls back.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Map, Value};
use shotbridge_core::entity::{Entity, EntityDraft, EntityId, EntityKind, EntityPatch};
use shotbridge_core::query::Query;
use shotbridge_core::types::Timestamp;
use uuid::Uuid;

use crate::config::TrackerConfig;
use crate::error::StoreError;
use crate::store::EntityStore;

const USER_HEADER: &str = "ftrack-user";
const API_KEY_HEADER: &str = "ftrack-api-key";

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// One operation in a batched API call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Operation {
    Query {
        expression: String,
    },
    Create {
        entity_type: String,
        entity_data: Value,
    },
    Update {
        entity_type: String,
        entity_key: Vec<String>,
        entity_data: Value,
    },
    Delete {
        entity_type: String,
        entity_key: Vec<String>,
    },
    GetUploadMetadata {
        component_id: String,
        file_name: String,
        file_size: u64,
    },
}

/// Attributes fetched for each entity kind.
fn projection(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Project | EntityKind::Status | EntityKind::Type | EntityKind::AssetType => {
            &["id", "name"]
        }
        EntityKind::Folder | EntityKind::Sequence | EntityKind::Shot => {
            &["id", "name", "parent_id", "description", "status_id", "thumbnail_id"]
        }
        EntityKind::Task => &[
            "id",
            "name",
            "parent_id",
            "description",
            "type_id",
            "status_id",
            "thumbnail_id",
        ],
        EntityKind::User => &["id", "username"],
        EntityKind::Appointment => &["id", "context_id", "resource_id", "type"],
        EntityKind::Asset => &["id", "name", "parent_id", "type_id"],
        EntityKind::AssetVersion => &["id", "asset_id", "task_id", "comment", "thumbnail_id"],
        EntityKind::Component => &["id", "name", "version_id"],
        EntityKind::Timelog => &["id", "context_id", "user_id", "start", "duration", "comment"],
    }
}

/// Render a query with an explicit projection: `select a, b from <expr>`.
pub fn select_expression(query: &Query) -> String {
    format!(
        "select {} from {}",
        projection(query.kind()).join(", "),
        query.expression()
    )
}

fn insert_id(map: &mut Map<String, Value>, key: &str, id: &Option<EntityId>) {
    if let Some(id) = id {
        map.insert(key.to_string(), json!(id.as_str()));
    }
}

/// Encode a draft as `entity_data` for a create operation.
pub fn draft_to_wire(draft: &EntityDraft, id: &EntityId) -> Value {
    let mut map = Map::new();
    map.insert("id".into(), json!(id.as_str()));
    if draft.kind == EntityKind::User {
        map.insert("username".into(), json!(draft.name));
    } else if !draft.name.is_empty() {
        map.insert("name".into(), json!(draft.name));
    }
    insert_id(&mut map, "parent_id", &draft.parent_id);
    insert_id(&mut map, "type_id", &draft.type_id);
    insert_id(&mut map, "status_id", &draft.status_id);
    insert_id(&mut map, "context_id", &draft.context_id);
    insert_id(&mut map, "resource_id", &draft.resource_id);
    insert_id(&mut map, "user_id", &draft.user_id);
    insert_id(&mut map, "asset_id", &draft.asset_id);
    insert_id(&mut map, "task_id", &draft.task_id);
    insert_id(&mut map, "version_id", &draft.version_id);
    if let Some(description) = &draft.description {
        map.insert("description".into(), json!(description));
    }
    if let Some(appointment_type) = &draft.appointment_type {
        map.insert("type".into(), json!(appointment_type));
    }
    if let Some(duration) = draft.duration_secs {
        map.insert("duration".into(), json!(duration));
    }
    if let Some(start) = draft.start {
        map.insert("start".into(), json!(start.to_rfc3339()));
    }
    if let Some(comment) = &draft.comment {
        map.insert("comment".into(), json!(comment));
    }
    Value::Object(map)
}

/// Encode a patch as `entity_data` for an update operation.
pub fn patch_to_wire(patch: &EntityPatch) -> Value {
    let mut map = Map::new();
    insert_id(&mut map, "status_id", &patch.status_id);
    insert_id(&mut map, "thumbnail_id", &patch.thumbnail_id);
    if let Some(description) = &patch.description {
        map.insert("description".into(), json!(description));
    }
    Value::Object(map)
}

fn str_field(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

fn id_field(data: &Value, key: &str) -> Option<EntityId> {
    str_field(data, key).map(EntityId::new)
}

/// Datetimes arrive either as RFC 3339 strings or wrapped as
/// `{"__type__": "datetime", "value": "..."}`.
fn timestamp_field(data: &Value, key: &str) -> Option<Timestamp> {
    let raw = match data.get(key)? {
        Value::String(s) => s.as_str(),
        Value::Object(obj) => obj.get("value")?.as_str()?,
        _ => return None,
    };
    chrono::DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

/// Decode one entity record from a query result.
pub fn entity_from_wire(kind: EntityKind, data: &Value) -> Result<Entity, StoreError> {
    let id = id_field(data, "id")
        .ok_or_else(|| StoreError::Decode(format!("{kind} record without id: {data}")))?;
    let name = match kind {
        EntityKind::User => str_field(data, "username"),
        _ => str_field(data, "name"),
    }
    .unwrap_or_default();

    let mut entity = Entity::new(kind, id, name);
    entity.parent_id = id_field(data, "parent_id");
    entity.description = str_field(data, "description");
    entity.type_id = id_field(data, "type_id");
    entity.status_id = id_field(data, "status_id");
    entity.context_id = id_field(data, "context_id");
    entity.resource_id = id_field(data, "resource_id");
    entity.user_id = id_field(data, "user_id");
    entity.asset_id = id_field(data, "asset_id");
    entity.task_id = id_field(data, "task_id");
    entity.version_id = id_field(data, "version_id");
    entity.thumbnail_id = id_field(data, "thumbnail_id");
    if kind == EntityKind::Appointment {
        entity.appointment_type = str_field(data, "type");
    }
    entity.duration_secs = data.get("duration").and_then(Value::as_f64).map(|d| d as i64);
    entity.start = timestamp_field(data, "start");
    entity.comment = str_field(data, "comment");
    Ok(entity)
}

/// Split a response body into per-operation results. A top-level object
/// carrying `exception` means the whole batch was refused.
pub fn decode_results(body: Value) -> Result<Vec<Value>, StoreError> {
    match body {
        Value::Array(results) => Ok(results),
        Value::Object(obj) if obj.contains_key("exception") => {
            let exception = obj
                .get("exception")
                .and_then(Value::as_str)
                .unwrap_or("ServerError");
            let content = obj.get("content").and_then(Value::as_str).unwrap_or_default();
            Err(StoreError::Rejected(format!("{exception}: {content}")))
        }
        other => Err(StoreError::Decode(format!("expected result array, got {other}"))),
    }
}

/// Decode the records of a single `query` result.
pub fn query_records(kind: EntityKind, result: &Value) -> Result<Vec<Entity>, StoreError> {
    let records = result
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::Decode(format!("query result without data: {result}")))?;
    records.iter().map(|r| entity_from_wire(kind, r)).collect()
}

// ---------------------------------------------------------------------------
// HttpStore
// ---------------------------------------------------------------------------

/// Entity type and id of a queued create.
fn created_key(operation: &Operation) -> Option<(String, String)> {
    match operation {
        Operation::Create {
            entity_type,
            entity_data,
        } => entity_data
            .get("id")
            .and_then(Value::as_str)
            .map(|id| (entity_type.clone(), id.to_string())),
        _ => None,
    }
}

/// Delete operations undoing `created`, newest first.
pub fn compensating_deletes(created: &[(String, String)]) -> Vec<Operation> {
    created
        .iter()
        .rev()
        .map(|(entity_type, id)| Operation::Delete {
            entity_type: entity_type.clone(),
            entity_key: vec![id.clone()],
        })
        .collect()
}

/// [`EntityStore`] backed by the tracker JSON API.
pub struct HttpStore {
    client: reqwest::Client,
    config: TrackerConfig,
    pending: Mutex<Vec<Operation>>,
    /// Creates the server already holds because an upload needed them,
    /// but which this session has not committed. Rollback deletes them.
    sent: Mutex<Vec<(String, String)>>,
}

impl HttpStore {
    pub fn new(config: TrackerConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            pending: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        })
    }

    fn pending(&self) -> MutexGuard<'_, Vec<Operation>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sent(&self) -> MutexGuard<'_, Vec<(String, String)>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send a batch of operations and return one result per operation.
    async fn call(&self, operations: &[Operation]) -> Result<Vec<Value>, StoreError> {
        let response = self
            .client
            .post(self.config.api_url())
            .header(USER_HEADER, &self.config.api_user)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(operations)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let results = decode_results(body)?;
        if results.len() != operations.len() {
            return Err(StoreError::Decode(format!(
                "sent {} operations, got {} results",
                operations.len(),
                results.len()
            )));
        }
        Ok(results)
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StoreError::from_status(status.as_u16(), body));
        }
        Ok(response)
    }

    /// Flush queued operations, keeping them queued if the call fails.
    async fn flush(&self) -> Result<(), StoreError> {
        let operations = self.pending().clone();
        if operations.is_empty() {
            return Ok(());
        }
        self.call(&operations).await?;
        let mut pending = self.pending();
        let flushed = operations.len().min(pending.len());
        pending.drain(..flushed);
        tracing::debug!(operations = flushed, "Flushed pending operations");
        Ok(())
    }

    /// Move the first `count` queued operations, plus `extra`, to the
    /// sent-but-uncommitted ledger.
    fn mark_sent(&self, count: usize, extra: &Operation) {
        let drained: Vec<Operation> = {
            let mut pending = self.pending();
            let count = count.min(pending.len());
            pending.drain(..count).collect()
        };
        self.sent()
            .extend(drained.iter().chain(std::iter::once(extra)).filter_map(created_key));
    }
}

#[async_trait]
impl EntityStore for HttpStore {
    fn api_user(&self) -> &str {
        &self.config.api_user
    }

    /// Queries run against server state only; queued writes are not
    /// flushed first.
    async fn query(&self, query: &Query) -> Result<Vec<Entity>, StoreError> {
        let operation = Operation::Query {
            expression: select_expression(query),
        };
        let results = self.call(std::slice::from_ref(&operation)).await?;
        query_records(query.kind(), &results[0])
    }

    async fn get(&self, kind: EntityKind, id: &EntityId) -> Result<Option<Entity>, StoreError> {
        self.first(&Query::new(kind).id_is(id)).await
    }

    async fn create(&self, draft: EntityDraft) -> Result<Entity, StoreError> {
        let id = EntityId::new(Uuid::new_v4().to_string());
        self.pending().push(Operation::Create {
            entity_type: draft.kind.as_str().to_string(),
            entity_data: draft_to_wire(&draft, &id),
        });
        Ok(draft.into_entity(id))
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        patch: EntityPatch,
    ) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        self.pending().push(Operation::Update {
            entity_type: kind.as_str().to_string(),
            entity_key: vec![id.as_str().to_string()],
            entity_data: patch_to_wire(&patch),
        });
        Ok(())
    }

    /// The server only hands out an upload URL for a component it holds,
    /// so the queued operations, the component create and the metadata
    /// request go out in one call. Creates sent this way stay uncommitted:
    /// [`rollback`](EntityStore::rollback) deletes them.
    async fn upload_component(
        &self,
        path: &Path,
        name: &str,
        version_id: Option<&EntityId>,
    ) -> Result<Entity, StoreError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());

        let mut draft = EntityDraft::new(EntityKind::Component, name);
        if let Some(version_id) = version_id {
            draft = draft.with_version(version_id);
        }
        let id = EntityId::new(Uuid::new_v4().to_string());
        let create = Operation::Create {
            entity_type: EntityKind::Component.as_str().to_string(),
            entity_data: draft_to_wire(&draft, &id),
        };
        let component = draft.into_entity(id);

        let mut operations = self.pending().clone();
        let queued = operations.len();
        operations.push(create.clone());
        operations.push(Operation::GetUploadMetadata {
            component_id: component.id.as_str().to_string(),
            file_name,
            file_size: bytes.len() as u64,
        });
        let results = self.call(&operations).await?;
        self.mark_sent(queued, &create);

        let metadata = results
            .last()
            .ok_or_else(|| StoreError::Decode("empty upload metadata result".into()))?;
        let url = metadata
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Decode("upload metadata without url".into()))?;

        let mut request = self.client.put(url).body(bytes);
        if let Some(headers) = metadata.get("headers").and_then(Value::as_object) {
            for (key, value) in headers {
                if let Some(value) = value.as_str() {
                    request = request.header(key.as_str(), value);
                }
            }
        }
        let response = request.send().await?;
        Self::ensure_success(response).await?;

        tracing::info!(component = %component.id, path = %path.display(), "Uploaded component");
        Ok(component)
    }

    async fn commit(&self) -> Result<(), StoreError> {
        self.flush().await?;
        self.sent().clear();
        Ok(())
    }

    async fn rollback(&self) -> Result<(), StoreError> {
        {
            let mut pending = self.pending();
            if !pending.is_empty() {
                tracing::debug!(operations = pending.len(), "Discarding pending operations");
            }
            pending.clear();
        }

        let sent = std::mem::take(&mut *self.sent());
        if sent.is_empty() {
            return Ok(());
        }
        tracing::info!(entities = sent.len(), "Deleting uncommitted entities sent with an upload");
        self.call(&compensating_deletes(&sent)).await?;
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
    use chrono::TimeZone;

    fn config() -> TrackerConfig {
        TrackerConfig {
            server_url: "http://127.0.0.1:9".into(),
            api_user: "jdoe".into(),
            api_key: "secret".into(),
            timeout_secs: 1,
        }
    }

    #[test]
    fn operations_serialize_with_action_tag() {
        let op = Operation::Query {
            expression: "Status".into(),
        };
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"action": "query", "expression": "Status"})
        );

        let op = Operation::Update {
            entity_type: "Task".into(),
            entity_key: vec!["t-1".into()],
            entity_data: json!({"status_id": "s-1"}),
        };
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({
                "action": "update",
                "entity_type": "Task",
                "entity_key": ["t-1"],
                "entity_data": {"status_id": "s-1"}
            })
        );
    }

    #[test]
    fn select_expression_includes_projection() {
        let query = Query::new(EntityKind::Status).name_is("Approved");
        assert_eq!(
            select_expression(&query),
            r#"select id, name from Status where name is "Approved""#
        );
    }

    #[test]
    fn draft_encoding_skips_unset_fields() {
        let draft = EntityDraft::new(EntityKind::Shot, "SH010")
            .with_parent(&EntityId::new("seq-1"))
            .with_description("Opening");
        let data = draft_to_wire(&draft, &EntityId::new("shot-1"));
        assert_eq!(
            data,
            json!({
                "id": "shot-1",
                "name": "SH010",
                "parent_id": "seq-1",
                "description": "Opening"
            })
        );
    }

    #[test]
    fn appointment_and_timelog_fields_encode() {
        let start = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let draft = EntityDraft::new(EntityKind::Timelog, "")
            .with_duration_secs(5400)
            .with_start(start)
            .with_comment("Logged 1.50 hours");
        let data = draft_to_wire(&draft, &EntityId::new("log-1"));
        assert_eq!(data["duration"], json!(5400));
        assert_eq!(data["start"], json!("2024-03-01T12:00:00+00:00"));
        assert!(data.get("name").is_none());

        let draft = EntityDraft::new(EntityKind::Appointment, "").with_appointment_type("assignment");
        assert_eq!(draft_to_wire(&draft, &EntityId::new("a-1"))["type"], json!("assignment"));
    }

    #[test]
    fn entity_decoding_reads_known_fields() {
        let data = json!({
            "id": "task-1",
            "name": "compositing",
            "parent_id": "shot-1",
            "status_id": "st-1",
            "start": {"__type__": "datetime", "value": "2024-03-01T12:00:00+00:00"},
            "duration": 3600.0
        });
        let entity = entity_from_wire(EntityKind::Task, &data).unwrap();
        assert_eq!(entity.name, "compositing");
        assert_eq!(entity.parent_id, Some(EntityId::new("shot-1")));
        assert_eq!(entity.duration_secs, Some(3600));
        assert!(entity.start.is_some());
    }

    #[test]
    fn user_name_comes_from_username() {
        let entity = entity_from_wire(EntityKind::User, &json!({"id": "u-1", "username": "jdoe"}))
            .unwrap();
        assert_eq!(entity.name, "jdoe");
    }

    #[test]
    fn record_without_id_is_decode_error() {
        assert_matches!(
            entity_from_wire(EntityKind::Shot, &json!({"name": "SH010"})),
            Err(StoreError::Decode(_))
        );
    }

    #[test]
    fn exception_payload_is_rejected() {
        let body = json!({"exception": "ServerError", "content": "Duplicate entry"});
        assert_matches!(
            decode_results(body),
            Err(StoreError::Rejected(msg)) if msg.contains("Duplicate entry")
        );
    }

    #[test]
    fn query_records_decode_data_array() {
        let result = json!({"action": "query", "data": [{"id": "s-1", "name": "Approved"}]});
        let records = query_records(EntityKind::Status, &result).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Approved");
    }

    #[tokio::test]
    async fn create_queues_until_rollback() {
        let store = HttpStore::new(config()).unwrap();
        let entity = store
            .create(EntityDraft::new(EntityKind::Sequence, "SEQ010"))
            .await
            .unwrap();
        assert!(Uuid::parse_str(entity.id.as_str()).is_ok());
        assert_eq!(store.pending().len(), 1);

        store.rollback().await.unwrap();
        assert!(store.pending().is_empty());
    }

    #[tokio::test]
    async fn empty_patch_is_not_queued() {
        let store = HttpStore::new(config()).unwrap();
        store
            .update(EntityKind::Task, &EntityId::new("t-1"), EntityPatch::default())
            .await
            .unwrap();
        assert!(store.pending().is_empty());
    }

    #[test]
    fn delete_serializes_with_entity_key() {
        let op = Operation::Delete {
            entity_type: "AssetVersion".into(),
            entity_key: vec!["v-1".into()],
        };
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"action": "delete", "entity_type": "AssetVersion", "entity_key": ["v-1"]})
        );
    }

    #[test]
    fn compensating_deletes_run_newest_first() {
        let created = vec![
            ("Asset".to_string(), "a-1".to_string()),
            ("AssetVersion".to_string(), "v-1".to_string()),
            ("Component".to_string(), "c-1".to_string()),
        ];
        let keys: Vec<_> = compensating_deletes(&created)
            .into_iter()
            .map(|op| match op {
                Operation::Delete { entity_key, .. } => entity_key[0].clone(),
                other => panic!("unexpected operation {other:?}"),
            })
            .collect();
        assert_eq!(keys, ["c-1", "v-1", "a-1"]);
    }

    #[test]
    fn created_key_reads_queued_creates_only() {
        let create = Operation::Create {
            entity_type: "AssetVersion".into(),
            entity_data: json!({"id": "v-1", "comment": "take 2"}),
        };
        assert_eq!(
            created_key(&create),
            Some(("AssetVersion".to_string(), "v-1".to_string()))
        );
        let update = Operation::Update {
            entity_type: "Task".into(),
            entity_key: vec!["t-1".into()],
            entity_data: json!({"status_id": "s-1"}),
        };
        assert_eq!(created_key(&update), None);
    }

    #[test]
    fn timelog_projection_has_no_name() {
        let expression = select_expression(&Query::new(EntityKind::Timelog));
        assert!(expression.starts_with("select id, context_id"), "{expression}");
        assert!(!expression.contains(", name"), "{expression}");
    }

    #[tokio::test]
    async fn query_does_not_flush_pending_writes() {
        let store = HttpStore::new(config()).unwrap();
        store
            .create(EntityDraft::new(EntityKind::AssetVersion, ""))
            .await
            .unwrap();

        let err = store
            .query(&Query::new(EntityKind::Project))
            .await
            .unwrap_err();
        assert!(err.is_connection_level(), "unexpected error: {err}");
        assert_eq!(store.pending().len(), 1);
    }

    #[tokio::test]
    async fn failed_upload_keeps_writes_pending_for_rollback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SH010.mov");
        std::fs::write(&path, b"mov").unwrap();
        let store = HttpStore::new(config()).unwrap();
        let version = store
            .create(EntityDraft::new(EntityKind::AssetVersion, ""))
            .await
            .unwrap();

        let err = store
            .upload_component(&path, "main", Some(&version.id))
            .await
            .unwrap_err();
        assert!(err.is_connection_level(), "unexpected error: {err}");
        assert_eq!(store.pending().len(), 1);
        assert!(store.sent().is_empty());

        store.rollback().await.unwrap();
        assert!(store.pending().is_empty());
    }

    #[tokio::test]
    async fn rollback_deletes_creates_sent_with_an_upload() {
        let store = HttpStore::new(config()).unwrap();
        store
            .pending()
            .push(Operation::Create {
                entity_type: "AssetVersion".into(),
                entity_data: json!({"id": "v-1"}),
            });
        let component = Operation::Create {
            entity_type: "Component".into(),
            entity_data: json!({"id": "c-1", "name": "main"}),
        };
        store.mark_sent(1, &component);
        assert!(store.pending().is_empty());
        assert_eq!(store.sent().len(), 2);

        // The deletes go to the unreachable server; the ledger is spent either way.
        let err = store.rollback().await.unwrap_err();
        assert!(err.is_connection_level(), "unexpected error: {err}");
        assert!(store.sent().is_empty());
    }

    #[tokio::test]
    async fn unreachable_server_is_connection_error() {
        let store = HttpStore::new(config()).unwrap();
        let err = store
            .query(&Query::new(EntityKind::Project))
            .await
            .unwrap_err();
        assert!(err.is_connection_level(), "unexpected error: {err}");
    }
}
