//! Integration tests for partial failure, cancellation and media handling
//! during batch creation.

mod common;

use std::ops::ControlFlow;
use std::sync::Arc;

use shotbridge_core::batch::{BatchParent, BatchProgress, ParentKind};
use shotbridge_core::entity::{EntityId, EntityKind};
use shotbridge_pipeline::BatchOptions;
use tokio_util::sync::CancellationToken;

use common::{creator, new_store, only, project_parent, record, run};

// ---------------------------------------------------------------------------
// Test: pre-flight
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_tracker_fails_before_any_shot() {
    let (store, project) = new_store();
    store.set_offline(true);
    let records = vec![record("SEQ010", "SH010", "Compositing")];

    let result = run(
        &mut creator(&store),
        &project_parent(&project),
        &records,
        &BatchOptions::execute(),
    )
    .await;

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("Cannot load project"));
    assert_eq!(result.counters(), Default::default());
}

#[tokio::test]
async fn missing_parent_is_reported() {
    let (store, _project) = new_store();
    let parent = BatchParent::new(ParentKind::Folder, EntityId::new("nope"));
    let records = vec![record("SEQ010", "SH010", "Compositing")];

    let result = run(&mut creator(&store), &parent, &records, &BatchOptions::execute()).await;

    assert!(!result.success);
    assert_eq!(result.errors, vec!["Parent not found: folder nope".to_string()]);
    assert_eq!(store.count(EntityKind::Sequence), 0);
}

// ---------------------------------------------------------------------------
// Test: partial failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_failed_shot_does_not_stop_the_batch() {
    let (store, project) = new_store();
    store.reject_creates_named("SH020");
    let records = vec![
        record("SEQ010", "SH010", "Compositing"),
        record("SEQ010", "SH020", "Compositing"),
        record("SEQ010", "SH030", "Compositing"),
    ];

    let result = run(
        &mut creator(&store),
        &project_parent(&project),
        &records,
        &BatchOptions::execute(),
    )
    .await;

    assert!(result.success);
    assert_eq!(result.shots_created, 2);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("SH020: "));
    assert_eq!(store.count(EntityKind::Shot), 2);
    assert_eq!(store.pending_count(), 0);
}

#[tokio::test]
async fn every_shot_failing_is_not_a_success() {
    let (store, project) = new_store();
    store.reject_creates_named("SH010");
    let records = vec![record("SEQ010", "SH010", "Compositing")];

    let result = run(
        &mut creator(&store),
        &project_parent(&project),
        &records,
        &BatchOptions::execute(),
    )
    .await;

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
}

#[tokio::test]
async fn failed_sequence_skips_only_its_group() {
    let (store, project) = new_store();
    store.reject_creates_named("SEQ010");
    let records = vec![
        record("SEQ010", "SH010", "Compositing"),
        record("SEQ010", "SH020", "Compositing"),
        record("SEQ020", "SH030", "Compositing"),
    ];
    let mut reports: Vec<BatchProgress> = Vec::new();
    let mut on_progress = |p: &BatchProgress| {
        reports.push(p.clone());
        ControlFlow::Continue(())
    };

    let result = creator(&store)
        .create_shots_from_table(
            &project_parent(&project),
            &records,
            Some(&mut on_progress),
            &BatchOptions::execute(),
        )
        .await;

    assert!(result.success);
    assert_eq!(result.sequences_created, 1);
    assert_eq!(result.shots_created, 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("Failed to create sequence SEQ010"));
    only(&store, EntityKind::Shot, "SH030");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].current, 3);
}

#[tokio::test]
async fn connection_loss_mid_batch_stops_with_partial_counters() {
    let (store, project) = new_store();
    let records = vec![
        record("SEQ010", "SH010", "Compositing"),
        record("SEQ010", "SH020", "Compositing"),
        record("SEQ010", "SH030", "Compositing"),
    ];
    let tracker = Arc::clone(&store);
    let mut on_progress = move |_: &BatchProgress| {
        tracker.set_offline(true);
        ControlFlow::Continue(())
    };

    let result = creator(&store)
        .create_shots_from_table(
            &project_parent(&project),
            &records,
            Some(&mut on_progress),
            &BatchOptions::execute(),
        )
        .await;

    assert!(!result.success);
    assert!(!result.cancelled);
    assert_eq!(result.shots_created, 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("SH020: "));
    assert_eq!(store.count(EntityKind::Shot), 1);
}

// ---------------------------------------------------------------------------
// Test: cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn callback_break_cancels_after_current_shot() {
    let (store, project) = new_store();
    let records = vec![
        record("SEQ010", "SH010", "Compositing"),
        record("SEQ010", "SH020", "Compositing"),
        record("SEQ020", "SH030", "Compositing"),
    ];
    let mut on_progress = |_: &BatchProgress| ControlFlow::Break(());

    let result = creator(&store)
        .create_shots_from_table(
            &project_parent(&project),
            &records,
            Some(&mut on_progress),
            &BatchOptions::execute(),
        )
        .await;

    assert!(result.cancelled);
    assert!(result.success);
    assert_eq!(result.shots_created, 1);
    assert_eq!(store.count(EntityKind::Shot), 1);
    assert_eq!(store.count(EntityKind::Sequence), 1);
}

#[tokio::test]
async fn cancelled_token_stops_before_first_shot() {
    let (store, project) = new_store();
    let token = CancellationToken::new();
    token.cancel();
    let records = vec![record("SEQ010", "SH010", "Compositing")];

    let result = run(
        &mut creator(&store),
        &project_parent(&project),
        &records,
        &BatchOptions::execute().with_cancel(token),
    )
    .await;

    assert!(result.cancelled);
    assert_eq!(result.counters(), Default::default());
    assert_eq!(store.count(EntityKind::Sequence), 0);
}

// ---------------------------------------------------------------------------
// Test: media
// ---------------------------------------------------------------------------

#[tokio::test]
async fn thumbnail_and_video_are_published() {
    let (store, project) = new_store();
    let dir = tempfile::tempdir().unwrap();
    let thumb = dir.path().join("SH010.jpg");
    let video = dir.path().join("SH010.mov");
    std::fs::write(&thumb, b"jpg").unwrap();
    std::fs::write(&video, b"mov").unwrap();
    let records = vec![record("SEQ010", "SH010", "Compositing")
        .with_thumbnail(&thumb)
        .with_video(&video)];

    let result = run(
        &mut creator(&store),
        &project_parent(&project),
        &records,
        &BatchOptions::execute(),
    )
    .await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.thumbnails_uploaded, 1);
    assert_eq!(result.versions_created, 1);
    let shot = only(&store, EntityKind::Shot, "SH010");
    assert!(shot.thumbnail_id.is_some());
    let version = &store.committed(EntityKind::AssetVersion)[0];
    assert!(version
        .comment
        .as_deref()
        .is_some_and(|c| c.starts_with("Editorial import of SH010 - ")));
}

#[tokio::test]
async fn missing_media_files_become_warnings() {
    let (store, project) = new_store();
    let records = vec![record("SEQ010", "SH010", "Compositing")
        .with_thumbnail("/no/such/SH010.jpg")
        .with_video("/no/such/SH010.mov")];

    let result = run(
        &mut creator(&store),
        &project_parent(&project),
        &records,
        &BatchOptions::execute(),
    )
    .await;

    assert!(result.success);
    assert_eq!(result.shots_created, 1);
    assert_eq!(result.thumbnails_uploaded, 0);
    assert_eq!(result.versions_created, 0);
    assert!(result
        .warnings
        .contains(&"Thumbnail not found for SH010: /no/such/SH010.jpg".to_string()));
    assert!(result
        .warnings
        .contains(&"Video not found for SH010: /no/such/SH010.mov".to_string()));
}

#[tokio::test]
async fn failed_upload_is_a_warning() {
    let (store, project) = new_store();
    store.set_fail_uploads(true);
    let dir = tempfile::tempdir().unwrap();
    let thumb = dir.path().join("SH010.jpg");
    std::fs::write(&thumb, b"jpg").unwrap();
    let records = vec![record("SEQ010", "SH010", "Compositing").with_thumbnail(&thumb)];

    let result = run(
        &mut creator(&store),
        &project_parent(&project),
        &records,
        &BatchOptions::execute(),
    )
    .await;

    assert!(result.success);
    assert!(result.errors.is_empty());
    assert_eq!(result.thumbnails_uploaded, 0);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.starts_with("Thumbnail not uploaded: SH010")));
}

#[tokio::test]
async fn dry_run_counts_media_without_uploading() {
    let (store, project) = new_store();
    let dir = tempfile::tempdir().unwrap();
    let thumb = dir.path().join("SH010.jpg");
    std::fs::write(&thumb, b"jpg").unwrap();
    let records = vec![record("SEQ010", "SH010", "Compositing").with_thumbnail(&thumb)];

    let result = run(
        &mut creator(&store),
        &project_parent(&project),
        &records,
        &BatchOptions::dry_run(),
    )
    .await;

    assert_eq!(result.thumbnails_uploaded, 1);
    assert_eq!(store.count(EntityKind::Component), 0);
}
