// tests/orchestrator_flow.rs

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;

use plugwatch::container::ContainerStatus;
use plugwatch::engine::{CycleOutcome, CycleReason, RuntimeEvent};
use plugwatch::errors::PlugwatchError;
use plugwatch::fs::mock::MockFileSystem;
use plugwatch::orchestrator::Orchestrator;
use plugwatch_test_utils::builders::ConfigFileBuilder;
use plugwatch_test_utils::fake_container::FakeContainerRuntime;
use plugwatch_test_utils::fake_executor::FakeCycleExecutor;
use plugwatch_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn orchestrator(fs: &MockFileSystem, runtime: &FakeContainerRuntime) -> Orchestrator {
    let cfg = ConfigFileBuilder::new("demo", "halohub/halo:2.20")
        .with_only_root("src/main")
        .build_in(Path::new("proj"));
    Orchestrator::new(cfg, Arc::new(fs.clone()), Arc::new(runtime.clone()))
}

#[tokio::test]
async fn once_runs_one_manual_cycle_and_tears_down() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    let runtime = FakeContainerRuntime::new();
    let orch = orchestrator(&fs, &runtime);

    let (tx, rx) = mpsc::unbounded_channel();
    let executor = FakeCycleExecutor::auto(tx.clone(), CycleOutcome::Succeeded);
    let log = executor.log();

    with_timeout(orch.run(executor, tx, rx, true)).await?;

    let jobs = log.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].reason, CycleReason::Manual);
    assert_eq!((runtime.creates(), runtime.starts(), runtime.kills()), (1, 1, 1));
    assert!(orch.containers().active().is_none());
    Ok(())
}

#[tokio::test]
async fn once_with_a_failed_cycle_is_an_error_after_teardown() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    let runtime = FakeContainerRuntime::new();
    let orch = orchestrator(&fs, &runtime);

    let (tx, rx) = mpsc::unbounded_channel();
    let executor = FakeCycleExecutor::auto(
        tx.clone(),
        CycleOutcome::Failed("build failed with exit code 1".into()),
    );
    let log = executor.log();

    let err = with_timeout(orch.run(executor, tx, rx, true)).await.unwrap_err();

    assert!(matches!(
        err,
        PlugwatchError::CycleFailed { cycle_id: 1, ref reason } if reason.contains("exit code 1")
    ));
    assert_eq!(log.len(), 1);
    assert_eq!(runtime.kills(), 1);
    assert!(orch.containers().active().is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn termination_while_waiting_for_readiness_kills_the_container() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    let runtime = FakeContainerRuntime::new().stuck_on_start();
    let orch = Arc::new(orchestrator(&fs, &runtime));

    let (tx, rx) = mpsc::unbounded_channel();
    let executor = FakeCycleExecutor::auto(tx.clone(), CycleOutcome::Succeeded);
    let log = executor.log();
    let (term_tx, term_rx) = oneshot::channel::<()>();

    let running = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move {
            let terminate = async move {
                let _ = term_rx.await;
            };
            orch.run_until(executor, tx, rx, false, terminate).await
        })
    };

    // Created and started, still polling for readiness.
    sleep(Duration::from_millis(700)).await;
    assert_eq!((runtime.creates(), runtime.starts(), runtime.kills()), (1, 1, 0));

    term_tx.send(()).map_err(|_| "run ended before termination")?;
    with_timeout(running).await??;

    assert_eq!(runtime.kills(), 1);
    assert!(log.is_empty(), "no cycle without a running container");
    assert!(orch.containers().active().is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn file_change_drives_a_cycle() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file_at("proj/src/main/A.java", vec![0u8; 100], 1);
    let runtime = FakeContainerRuntime::new();
    let orch = Arc::new(orchestrator(&fs, &runtime));

    let (tx, rx) = mpsc::unbounded_channel();
    let executor = FakeCycleExecutor::auto(tx.clone(), CycleOutcome::Succeeded);
    let log = executor.log();

    let shutdown = tx.clone();
    let running = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move { orch.run(executor, tx, rx, false).await })
    };

    // Container up and watcher's initial scan done.
    sleep(Duration::from_millis(50)).await;
    assert!(log.is_empty(), "no cycle without a change");

    fs.add_file_at("proj/src/main/A.java", vec![0u8; 120], 2);
    sleep(Duration::from_secs(2)).await;

    let jobs = log.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].reason, CycleReason::FileWatch);
    assert!(jobs[0].changes.modified.contains(&PathBuf::from("proj/src/main/A.java")));

    shutdown.send(RuntimeEvent::ShutdownRequested)?;
    with_timeout(running).await??;
    assert_eq!(runtime.kills(), 1);
    Ok(())
}

#[tokio::test]
async fn start_failure_aborts_run_and_kills_container() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    let runtime = FakeContainerRuntime::new().fail_start("port 8090 already allocated");
    let orch = orchestrator(&fs, &runtime);

    let (tx, rx) = mpsc::unbounded_channel();
    let executor = FakeCycleExecutor::auto(tx.clone(), CycleOutcome::Succeeded);
    let log = executor.log();

    let err = with_timeout(orch.run(executor, tx, rx, true)).await.unwrap_err();

    assert!(matches!(err, PlugwatchError::ContainerStartError(_)));
    assert!(log.is_empty(), "no reload cycle without a running container");
    assert_eq!(runtime.kills(), 1);
    Ok(())
}

#[tokio::test]
async fn creation_failure_is_fatal() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    let runtime = FakeContainerRuntime::new().fail_create("no such image");
    let orch = orchestrator(&fs, &runtime);

    let (tx, rx) = mpsc::unbounded_channel();
    let executor = FakeCycleExecutor::auto(tx.clone(), CycleOutcome::Succeeded);

    let err = with_timeout(orch.run(executor, tx, rx, true)).await.unwrap_err();
    assert!(matches!(err, PlugwatchError::ContainerCreationError(_)));
    assert_eq!(runtime.kills(), 0);
    Ok(())
}

#[tokio::test]
async fn started_container_is_running_before_first_cycle() -> TestResult {
    init_tracing();
    let fs = MockFileSystem::new();
    let runtime = FakeContainerRuntime::new();
    let orch = orchestrator(&fs, &runtime);

    let handle = with_timeout(orch.start_container()).await?;
    assert_eq!(handle.status(), ContainerStatus::Running);
    assert!(runtime.is_running(handle.id()));
    Ok(())
}
