//! Subcommand handlers.

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use shotbridge_core::batch::{BatchParent, BatchProgress};
use shotbridge_core::entity::{Entity, EntityId};
use shotbridge_core::media::{find_thumbnail, find_video};
use shotbridge_core::shot_record::{parse_records_json, ShotRecord};
use shotbridge_core::status::suggest_statuses;
use shotbridge_core::task_type::suggest_task_types;
use shotbridge_pipeline::{
    list_projects, project_children, search_projects, BatchOptions, BatchShotCreator,
    ReviewPublisher, TimeLogService,
};
use shotbridge_store::{EntityStore, HttpStore, MemoryStore, TrackerConfig};
use tokio_util::sync::CancellationToken;

use crate::args::{Cli, Command, CreateArgs, SuggestKind};

/// User the mock store acts as when `TRACKER_API_USER` is unset.
const MOCK_USER: &str = "mock";

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mock = cli.mock;
    match cli.command {
        Command::Create(args) => {
            let parent = BatchParent::new(args.parent_kind, args.parent_id.as_str());
            let store = open_store(mock, Some(&parent))?;
            create(store, parent, args).await
        }
        Command::LogTime {
            task_id,
            hours,
            comment,
            date,
        } => {
            let service = TimeLogService::new(open_store(mock, None)?);
            let log = service
                .create_timelog(&EntityId::new(task_id), hours, comment.as_deref(), date)
                .await?;
            println!("{}", serde_json::to_string_pretty(&log)?);
            Ok(())
        }
        Command::Today { task_id } => {
            let service = TimeLogService::new(open_store(mock, None)?);
            let task_id = task_id.map(EntityId::new);
            let logs = service.today_timelogs(task_id.as_ref()).await?;
            let total_secs: i64 = logs.iter().filter_map(|l| l.duration_secs).sum();
            for log in &logs {
                println!(
                    "{}  {:>6.2}h  {}",
                    log.context_id.as_ref().map(EntityId::as_str).unwrap_or("-"),
                    log.duration_secs.unwrap_or(0) as f64 / 3600.0,
                    log.comment.as_deref().unwrap_or("")
                );
            }
            println!("{} logs, {:.2} hours", logs.len(), total_secs as f64 / 3600.0);
            Ok(())
        }
        Command::MyTasks => {
            let mut service = TimeLogService::new(open_store(mock, None)?);
            let tasks = service.my_tasks_in_progress().await?;
            print_entities(&tasks);
            Ok(())
        }
        Command::Types => {
            let creator = BatchShotCreator::new(open_store(mock, None)?);
            for name in creator.task_type_names().await? {
                println!("{name}");
            }
            Ok(())
        }
        Command::Publish {
            task_id,
            video,
            comment,
        } => {
            let publisher = ReviewPublisher::new(open_store(mock, None)?);
            let published = publisher
                .publish(&EntityId::new(task_id), &video, comment.as_deref())
                .await?;
            println!(
                "Published version {} of {} on task {}",
                published.version.id, published.parent.name, published.task.name
            );
            Ok(())
        }
        Command::Projects { search } => {
            let store = open_store(mock, None)?;
            let projects = match search.as_deref() {
                Some(term) => search_projects(store.as_ref(), term).await?,
                None => list_projects(store.as_ref()).await?,
            };
            print_entities(&projects);
            Ok(())
        }
        Command::Children { parent_id } => {
            let store = open_store(mock, None)?;
            let children = project_children(store.as_ref(), &EntityId::new(parent_id)).await?;
            for child in &children {
                let marker = if child.expandable { "+" } else { " " };
                let entity = &child.entity;
                println!("{marker} {:<8}  {}  {}", entity.kind.as_str(), entity.id, entity.name);
            }
            println!("{} found", children.len());
            Ok(())
        }
        Command::Suggest { kind, prefix } => {
            for name in suggestions(kind, &prefix) {
                println!("{name}");
            }
            Ok(())
        }
    }
}

/// Connect to the configured tracker, or build a seeded in-memory one.
///
/// The mock store gets the batch parent seeded so a `create` run has
/// somewhere to land.
fn open_store(mock: bool, parent: Option<&BatchParent>) -> anyhow::Result<Arc<dyn EntityStore>> {
    if mock {
        let user = std::env::var("TRACKER_API_USER").unwrap_or_else(|_| MOCK_USER.to_string());
        let store = MemoryStore::with_defaults(user);
        if let Some(parent) = parent {
            let name = format!("mock-{}", parent.id);
            store.seed(Entity::new(parent.kind.entity_kind(), parent.id.clone(), name));
        }
        tracing::info!("Using in-memory tracker");
        return Ok(Arc::new(store));
    }

    let config = TrackerConfig::from_env().context("Tracker configuration")?;
    tracing::info!(server = %config.server_url, user = %config.api_user, "Connecting to tracker");
    Ok(Arc::new(HttpStore::new(config)?))
}

async fn create(store: Arc<dyn EntityStore>, parent: BatchParent, args: CreateArgs) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(&args.records)
        .await
        .with_context(|| format!("Cannot read {}", args.records.display()))?;
    let mut records = parse_records_json(&raw)?;
    fill_media_paths(&mut records, args.thumb_dir.as_deref(), args.video_dir.as_deref());

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current shot");
            on_ctrl_c.cancel();
        }
    });

    let mut options = if args.dry_run {
        BatchOptions::dry_run()
    } else {
        BatchOptions::execute()
    };
    options = options.with_cancel(cancel);

    let mut on_progress = |p: &BatchProgress| {
        tracing::info!(current = p.current, total = p.total, "{}", p.message);
        ControlFlow::Continue(())
    };

    let mut creator = BatchShotCreator::new(store);
    let result = creator
        .create_shots_from_table(&parent, &records, Some(&mut on_progress), &options)
        .await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.summary());
        for warning in &result.warnings {
            println!("warning: {warning}");
        }
        for error in &result.errors {
            println!("error: {error}");
        }
    }

    if !result.success {
        anyhow::bail!("batch failed with {} errors", result.errors.len());
    }
    Ok(())
}

/// Fill in thumbnail and video paths that a record lacks by searching the
/// given directories for files named after the shot.
pub fn fill_media_paths(records: &mut [ShotRecord], thumb_dir: Option<&Path>, video_dir: Option<&Path>) {
    for record in records.iter_mut() {
        let shot = record.name().to_string();
        if shot.is_empty() {
            continue;
        }
        if let Some(dir) = thumb_dir {
            if record.existing_thumbnail().is_none() {
                if let Some(found) = find_thumbnail(dir, &shot) {
                    tracing::debug!(shot = %shot, path = %found.display(), "Found thumbnail");
                    record.thumbnail_path = Some(found);
                }
            }
        }
        if let Some(dir) = video_dir {
            if record.existing_video().is_none() {
                if let Some(found) = find_video(dir, &shot) {
                    tracing::debug!(shot = %shot, path = %found.display(), "Found video");
                    record.video_path = Some(found);
                }
            }
        }
    }
}

fn suggestions(kind: SuggestKind, prefix: &str) -> Vec<&'static str> {
    match kind {
        SuggestKind::TaskTypes => suggest_task_types(prefix),
        SuggestKind::Statuses => suggest_statuses(prefix),
    }
}

fn print_entities(entities: &[Entity]) {
    for entity in entities {
        println!("{}  {}", entity.id, entity.name);
    }
    println!("{} found", entities.len());
}
