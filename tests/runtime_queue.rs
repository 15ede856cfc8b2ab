// tests/runtime_queue.rs

use std::error::Error;
use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use plugwatch::engine::{
    CoreRuntime, CycleOutcome, CycleReason, Runtime, RuntimeEvent, RuntimeOptions,
};
use plugwatch::watch::ChangeSet;
use plugwatch_test_utils::fake_executor::FakeCycleExecutor;
use plugwatch_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn file_watch(path: &str) -> RuntimeEvent {
    let mut changes = ChangeSet::default();
    changes.modified.insert(PathBuf::from(path));
    RuntimeEvent::CycleRequested {
        changes,
        reason: CycleReason::FileWatch,
    }
}

#[tokio::test]
async fn notifications_mid_cycle_queue_instead_of_overlapping() -> TestResult {
    init_tracing();

    let (tx, rx) = mpsc::unbounded_channel();
    let executor = FakeCycleExecutor::manual(tx.clone());
    let log = executor.log();
    let runtime = Runtime::new(CoreRuntime::new(1, RuntimeOptions::default()), rx, executor);
    let task = tokio::spawn(runtime.run());

    tx.send(file_watch("A.java"))?;
    tx.send(file_watch("B.java"))?;
    tx.send(file_watch("C.java"))?;
    sleep(Duration::from_millis(50)).await;

    // Only the first cycle is running; B and C wait, merged into one.
    assert_eq!(log.len(), 1);

    tx.send(RuntimeEvent::CycleFinished {
        cycle_id: 1,
        outcome: CycleOutcome::Failed("build failed with exit code 1".into()),
    })?;
    sleep(Duration::from_millis(50)).await;

    let jobs = log.jobs();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[1].cycle_id, 2);
    assert_eq!(jobs[1].changes.modified.len(), 2);

    tx.send(RuntimeEvent::CycleFinished {
        cycle_id: 2,
        outcome: CycleOutcome::Succeeded,
    })?;
    sleep(Duration::from_millis(50)).await;
    assert_eq!(log.len(), 2, "nothing left in the queue");

    tx.send(RuntimeEvent::ShutdownRequested)?;
    with_timeout(task).await??;
    Ok(())
}

#[tokio::test]
async fn once_mode_exits_after_seeded_cycle() -> TestResult {
    init_tracing();

    let (tx, rx) = mpsc::unbounded_channel();
    let executor = FakeCycleExecutor::auto(tx.clone(), CycleOutcome::Succeeded);
    let log = executor.log();
    let runtime = Runtime::new(
        CoreRuntime::new(1, RuntimeOptions { exit_when_idle: true }),
        rx,
        executor,
    );

    tx.send(RuntimeEvent::CycleRequested {
        changes: ChangeSet::default(),
        reason: CycleReason::Manual,
    })?;

    with_timeout(runtime.run()).await?;

    let jobs = log.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].reason, CycleReason::Manual);
    Ok(())
}

#[tokio::test]
async fn longer_queue_runs_each_request_in_order() -> TestResult {
    init_tracing();

    let (tx, rx) = mpsc::unbounded_channel();
    let executor = FakeCycleExecutor::manual(tx.clone());
    let log = executor.log();
    let runtime = Runtime::new(CoreRuntime::new(3, RuntimeOptions::default()), rx, executor);
    let task = tokio::spawn(runtime.run());

    for name in ["A.java", "B.java", "C.java"] {
        tx.send(file_watch(name))?;
    }
    for cycle_id in 1..=3 {
        sleep(Duration::from_millis(20)).await;
        tx.send(RuntimeEvent::CycleFinished {
            cycle_id,
            outcome: CycleOutcome::Succeeded,
        })?;
    }
    sleep(Duration::from_millis(20)).await;

    let order: Vec<PathBuf> = log
        .jobs()
        .iter()
        .flat_map(|job| job.changes.modified.iter().cloned())
        .collect();
    assert_eq!(
        order,
        vec![PathBuf::from("A.java"), PathBuf::from("B.java"), PathBuf::from("C.java")]
    );

    tx.send(RuntimeEvent::ShutdownRequested)?;
    with_timeout(task).await??;
    Ok(())
}
