//! Artist time logging against tracker tasks.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use shotbridge_core::entity::{Entity, EntityDraft, EntityId, EntityKind};
use shotbridge_core::error::CoreError;
use shotbridge_core::query::Query;
use shotbridge_core::status::IN_PROGRESS;
use shotbridge_core::types::Timestamp;
use shotbridge_store::EntityStore;

use crate::error::PipelineError;
use crate::reconciler::create_committed;
use crate::status_resolver::StatusResolver;

/// Maximum number of tasks listed by [`TimeLogService::my_tasks_in_progress`].
const MY_TASKS_LIMIT: usize = 200;

/// Creates and lists time logs for the session's API user.
pub struct TimeLogService {
    store: Arc<dyn EntityStore>,
    statuses: StatusResolver,
}

impl TimeLogService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            statuses: StatusResolver::new(),
        }
    }

    /// The tracker user matching the session's API user.
    pub async fn acting_user(&self) -> Result<Entity, PipelineError> {
        let username = self.store.api_user();
        self.store
            .first(&Query::new(EntityKind::User).username_is(username))
            .await?
            .ok_or_else(|| PipelineError::UnknownUser(username.to_string()))
    }

    /// Log `hours` against a task.
    ///
    /// The log starts at noon UTC on `date`, or now when no date is given.
    /// Without a comment, one is generated from the hours.
    pub async fn create_timelog(
        &self,
        task_id: &EntityId,
        hours: f64,
        comment: Option<&str>,
        date: Option<NaiveDate>,
    ) -> Result<Entity, PipelineError> {
        if !hours.is_finite() || hours <= 0.0 {
            return Err(CoreError::Validation(format!("hours must be positive, got {hours}")).into());
        }

        let store = self.store.as_ref();
        let task = store
            .get(EntityKind::Task, task_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                kind: EntityKind::Task,
                id: task_id.clone(),
            })?;
        let user = self.acting_user().await?;

        let comment = match comment.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) => c.to_string(),
            None => format!("Logged {hours:.2} hours"),
        };
        let draft = EntityDraft::new(EntityKind::Timelog, "")
            .with_context(&task.id)
            .with_user(&user.id)
            .with_duration_secs(duration_secs(hours))
            .with_start(start_time(date))
            .with_comment(&comment);

        let timelog = create_committed(store, draft).await?;
        tracing::info!(task = %task.name, hours, user = %user.name, "Logged time");
        Ok(timelog)
    }

    /// The acting user's logs since UTC midnight, optionally for one task.
    pub async fn today_timelogs(
        &self,
        task_id: Option<&EntityId>,
    ) -> Result<Vec<Entity>, PipelineError> {
        let user = self.acting_user().await?;
        let mut query = Query::new(EntityKind::Timelog)
            .user_is(&user.id)
            .starting_from(midnight_utc());
        if let Some(task_id) = task_id {
            query = query.context_is(task_id);
        }
        Ok(self.store.query(&query).await?)
    }

    /// Tasks assigned to the acting user in the tracker's "in progress"
    /// status. Empty when that status does not exist.
    pub async fn my_tasks_in_progress(&mut self) -> Result<Vec<Entity>, PipelineError> {
        let user = self.acting_user().await?;
        let Some(status) = self.statuses.resolve(self.store.as_ref(), IN_PROGRESS).await else {
            tracing::warn!("No in-progress status on tracker");
            return Ok(Vec::new());
        };

        let query = Query::new(EntityKind::Task)
            .assigned_to(&user.id)
            .status_name_is(&status)
            .limit(MY_TASKS_LIMIT);
        Ok(self.store.query(&query).await?)
    }
}

/// Whole seconds for a duration in hours.
pub fn duration_secs(hours: f64) -> i64 {
    (hours * 3600.0).round() as i64
}

fn start_time(date: Option<NaiveDate>) -> Timestamp {
    match date {
        Some(date) => date.and_time(NaiveTime::MIN + chrono::Duration::hours(12)).and_utc(),
        None => Utc::now(),
    }
}

fn midnight_utc() -> Timestamp {
    Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc()
}
