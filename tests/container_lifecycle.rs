// tests/container_lifecycle.rs

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use plugwatch::container::{
    container_id_file, ContainerManager, ContainerSpec, ContainerStatus, ExitHook,
};
use plugwatch::engine::RuntimeEvent;
use plugwatch::errors::PlugwatchError;
use plugwatch::fs::mock::MockFileSystem;
use plugwatch::fs::FileSystem;
use plugwatch_test_utils::fake_container::FakeContainerRuntime;
use plugwatch_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn manager(runtime: &FakeContainerRuntime, fs: &MockFileSystem) -> Arc<ContainerManager> {
    let id_file = container_id_file(Path::new("build/.docker"), ":plugin:watch");
    Arc::new(ContainerManager::new(
        Arc::new(runtime.clone()),
        Arc::new(fs.clone()),
        id_file,
    ))
}

fn spec() -> ContainerSpec {
    let mut spec = ContainerSpec::new("halohub/halo:2.20");
    spec.ports.push("8090:8090".parse().unwrap());
    spec
}

#[tokio::test]
async fn create_start_wait_reaches_running() -> TestResult {
    init_tracing();
    let runtime = FakeContainerRuntime::new();
    let fs = MockFileSystem::new();
    let mgr = manager(&runtime, &fs);

    let handle = mgr.create(&spec()).await?;
    assert_eq!(handle.status(), ContainerStatus::Created);

    mgr.start(&handle).await?;
    with_timeout(mgr.wait_until_running(&handle, Duration::from_secs(1))).await?;

    assert_eq!(handle.status(), ContainerStatus::Running);
    assert!(runtime.is_running(handle.id()));
    assert_eq!(
        fs.read_to_string(Path::new("build/.docker/plugin_watch-containerId.txt"))?,
        handle.id()
    );
    Ok(())
}

#[tokio::test]
async fn exit_hook_and_normal_shutdown_kill_once() -> TestResult {
    init_tracing();
    let runtime = FakeContainerRuntime::new();
    let fs = MockFileSystem::new();
    let mgr = manager(&runtime, &fs);

    let handle = mgr.create(&spec()).await?;
    mgr.start(&handle).await?;

    let hook = ExitHook::new(Arc::clone(&mgr));
    hook.fire().await;
    mgr.kill(&handle).await;

    assert_eq!(runtime.kills(), 1);
    assert_eq!(handle.status(), ContainerStatus::Killed);
    assert!(mgr.active().is_none());
    Ok(())
}

#[tokio::test]
async fn hook_armed_before_create_kills_the_later_container() -> TestResult {
    init_tracing();
    let runtime = FakeContainerRuntime::new().stuck_on_start();
    let fs = MockFileSystem::new();
    let mgr = manager(&runtime, &fs);

    let (fire_tx, fire_rx) = oneshot::channel::<()>();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let armed = ExitHook::new(Arc::clone(&mgr)).register_on(
        async move {
            let _ = fire_rx.await;
        },
        tx,
    );

    let handle = mgr.create(&spec()).await?;
    mgr.start(&handle).await?;
    assert!(!armed.has_fired());

    fire_tx.send(()).map_err(|_| "hook task is gone")?;
    with_timeout(armed.fired()).await;

    assert_eq!(runtime.kills(), 1);
    assert_eq!(handle.status(), ContainerStatus::Killed);
    assert!(matches!(rx.recv().await, Some(RuntimeEvent::ShutdownRequested)));
    Ok(())
}

#[tokio::test]
async fn hook_with_no_container_is_a_no_op() -> TestResult {
    init_tracing();
    let runtime = FakeContainerRuntime::new();
    let fs = MockFileSystem::new();
    let mgr = manager(&runtime, &fs);

    ExitHook::new(Arc::clone(&mgr)).fire().await;
    assert_eq!(runtime.kills(), 0);
    Ok(())
}

#[tokio::test]
async fn concurrent_kills_reach_the_runtime_once() -> TestResult {
    init_tracing();
    let runtime = FakeContainerRuntime::new();
    let fs = MockFileSystem::new();
    let mgr = manager(&runtime, &fs);

    let handle = mgr.create(&spec()).await?;
    mgr.start(&handle).await?;

    let hook = ExitHook::new(Arc::clone(&mgr));
    let fired = tokio::spawn(async move { hook.fire().await });
    mgr.kill(&handle).await;
    fired.await?;

    assert_eq!(runtime.kills(), 1);
    assert_eq!(handle.status(), ContainerStatus::Killed);
    Ok(())
}

#[tokio::test]
async fn second_create_in_same_run_is_rejected() -> TestResult {
    init_tracing();
    let runtime = FakeContainerRuntime::new();
    let fs = MockFileSystem::new();
    let mgr = manager(&runtime, &fs);

    let _first = mgr.create(&spec()).await?;
    let err = mgr.create(&spec()).await.unwrap_err();

    assert!(matches!(err, PlugwatchError::ContainerCreationError(_)));
    assert_eq!(runtime.creates(), 1);
    Ok(())
}

#[tokio::test]
async fn recorded_container_is_reused() -> TestResult {
    init_tracing();
    let runtime = FakeContainerRuntime::new().with_existing("abc123", true);
    let fs = MockFileSystem::new();
    fs.add_file("build/.docker/plugin_watch-containerId.txt", "abc123\n");
    let mgr = manager(&runtime, &fs);

    let handle = mgr.create(&spec()).await?;

    assert_eq!(handle.id(), "abc123");
    assert_eq!(handle.status(), ContainerStatus::Running);
    assert_eq!(runtime.creates(), 0);

    // Already running: start is a no-op.
    mgr.start(&handle).await?;
    assert_eq!(runtime.starts(), 0);
    Ok(())
}

#[tokio::test]
async fn stale_recovery_file_falls_back_to_create() -> TestResult {
    init_tracing();
    let runtime = FakeContainerRuntime::new();
    let fs = MockFileSystem::new();
    fs.add_file("build/.docker/plugin_watch-containerId.txt", "gone");
    let mgr = manager(&runtime, &fs);

    let handle = mgr.create(&spec()).await?;

    assert_eq!(handle.id(), "fake-1");
    assert_eq!(runtime.creates(), 1);
    assert_eq!(mgr.recorded_id().as_deref(), Some("fake-1"));
    Ok(())
}

#[tokio::test]
async fn rejected_create_surfaces_creation_error() -> TestResult {
    init_tracing();
    let runtime = FakeContainerRuntime::new().fail_create("image not found");
    let fs = MockFileSystem::new();
    let mgr = manager(&runtime, &fs);

    let err = mgr.create(&spec()).await.unwrap_err();
    assert!(matches!(err, PlugwatchError::ContainerCreationError(_)));
    assert!(mgr.active().is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn container_that_never_runs_times_out() -> TestResult {
    init_tracing();
    let runtime = FakeContainerRuntime::new().stuck_on_start();
    let fs = MockFileSystem::new();
    let mgr = manager(&runtime, &fs);

    let handle = mgr.create(&spec()).await?;
    mgr.start(&handle).await?;
    let err = mgr
        .wait_until_running(&handle, Duration::from_secs(3))
        .await
        .unwrap_err();

    assert!(matches!(err, PlugwatchError::ContainerStartError(_)));
    Ok(())
}

#[tokio::test]
async fn killed_container_cannot_be_started() -> TestResult {
    init_tracing();
    let runtime = FakeContainerRuntime::new();
    let fs = MockFileSystem::new();
    let mgr = manager(&runtime, &fs);

    let handle = mgr.create(&spec()).await?;
    mgr.kill(&handle).await;

    let err = mgr.start(&handle).await.unwrap_err();
    assert!(matches!(err, PlugwatchError::ContainerStartError(_)));
    assert_eq!(runtime.starts(), 0);
    Ok(())
}
