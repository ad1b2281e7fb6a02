// ABOUTME: Replace-sequence tests: ordering, gating, and stage-tagged failures.
// ABOUTME: Exercises stop -> remove -> create -> start against the fake daemon.

mod support;

use molt::runtime::ContainerError;
use molt::types::ImageRef;
use molt::update::{ReplaceStage, UpdateError, UpdateErrorKind, replace};
use std::time::Duration;
use support::FakeRuntime;

const TIMEOUT: Duration = Duration::from_secs(5);

fn target_image() -> ImageRef {
    ImageRef::parse("app:1.0@sha256:d2").unwrap()
}

#[tokio::test]
async fn happy_path_runs_stages_in_order() {
    let runtime = FakeRuntime::new();
    let snap = support::snapshot("web", "app:1.0", "sha256:d1");
    runtime.add_running(snap.clone());

    let new_id = replace(&runtime, &snap, target_image(), TIMEOUT, TIMEOUT)
        .await
        .unwrap();

    assert_eq!(new_id.as_str(), "fake-1");
    assert_eq!(
        runtime.ops(),
        vec!["stop:web", "remove:web", "create:web", "start:web"]
    );
    assert_eq!(runtime.running_names(), vec!["web"]);
}

#[tokio::test]
async fn replacement_runs_the_pinned_image() {
    let runtime = FakeRuntime::new();
    let snap = support::snapshot("web", "app:1.0", "sha256:d1");
    runtime.add_running(snap.clone());

    replace(&runtime, &snap, target_image(), TIMEOUT, TIMEOUT)
        .await
        .unwrap();

    let created = runtime.created_specs();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].image.to_string(), "app:1.0@sha256:d2");
    assert_eq!(created[0].host_config, snap.host_config);
}

#[tokio::test]
async fn stop_failure_aborts_before_remove() {
    let runtime = FakeRuntime::new();
    let snap = support::snapshot("web", "app:1.0", "sha256:d1");
    runtime.add_running(snap.clone());
    runtime.fail_stop("web");

    let failed = replace(&runtime, &snap, target_image(), TIMEOUT, TIMEOUT)
        .await
        .unwrap_err();

    assert_eq!(failed.stage, ReplaceStage::Stop);
    assert_eq!(failed.name, "web");
    // The old container was never destroyed.
    assert_eq!(runtime.ops(), vec!["stop:web"]);
    assert_eq!(runtime.running_names(), vec!["web"]);
}

#[tokio::test]
async fn remove_failure_still_attempts_replacement() {
    let runtime = FakeRuntime::new();
    let snap = support::snapshot("web", "app:1.0", "sha256:d1");
    runtime.add_running(snap.clone());
    runtime.fail_remove("web");

    let result = replace(&runtime, &snap, target_image(), TIMEOUT, TIMEOUT).await;

    assert!(result.is_ok());
    assert_eq!(
        runtime.ops(),
        vec!["stop:web", "remove:web", "create:web", "start:web"]
    );
}

#[tokio::test]
async fn create_failure_is_stage_tagged() {
    let runtime = FakeRuntime::new();
    let snap = support::snapshot("web", "app:1.0", "sha256:d1");
    runtime.add_running(snap.clone());
    runtime.fail_create("web");

    let failed = replace(&runtime, &snap, target_image(), TIMEOUT, TIMEOUT)
        .await
        .unwrap_err();

    assert_eq!(failed.stage, ReplaceStage::Create);
    // No rollback: the old container is gone and nothing replaced it.
    assert!(runtime.running_names().is_empty());
}

#[tokio::test(start_paused = true)]
async fn hung_stop_times_out_as_stop_failure() {
    let runtime = FakeRuntime::new();
    let snap = support::snapshot("web", "app:1.0", "sha256:d1");
    runtime.add_running(snap.clone());
    runtime.delay_stop("web", Duration::from_secs(3600));

    let failed = replace(&runtime, &snap, target_image(), TIMEOUT, TIMEOUT)
        .await
        .unwrap_err();

    assert_eq!(failed.stage, ReplaceStage::Stop);
    assert!(matches!(failed.error, ContainerError::Timeout(_)));
    // The hung call was abandoned before anything destructive happened.
    assert_eq!(runtime.ops(), vec!["stop:web"]);
    assert_eq!(runtime.running_names(), vec!["web"]);
}

#[test]
fn replace_failure_converts_to_stage_tagged_error() {
    let failed = molt::update::ReplaceFailed {
        name: "web".to_string(),
        stage: ReplaceStage::Create,
        error: ContainerError::Runtime("boom".to_string()),
    };

    let error = UpdateError::from(failed);

    assert_eq!(error.kind(), UpdateErrorKind::Replace(ReplaceStage::Create));
    assert!(error.to_string().contains("create failed for container web"));
}

#[tokio::test]
async fn start_failure_leaves_created_container_in_place() {
    let runtime = FakeRuntime::new();
    let snap = support::snapshot("web", "app:1.0", "sha256:d1");
    runtime.add_running(snap.clone());
    runtime.fail_start("web");

    let failed = replace(&runtime, &snap, target_image(), TIMEOUT, TIMEOUT)
        .await
        .unwrap_err();

    assert_eq!(failed.stage, ReplaceStage::Start);
    // The created container stays for inspection, stopped.
    assert_eq!(runtime.created_specs().len(), 1);
    assert!(runtime.running_names().is_empty());
}
