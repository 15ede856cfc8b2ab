// tests/watcher_timing.rs

use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{sleep, Instant};

use plugwatch::fs::mock::MockFileSystem;
use plugwatch::watch::{ChangeSet, Debouncer, DirectoryScanner, WatchPhase, WatchSession};
use plugwatch_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const POLL: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(800);

fn modified(path: &str) -> ChangeSet {
    let mut changes = ChangeSet::default();
    changes.modified.insert(PathBuf::from(path));
    changes
}

#[test]
fn change_just_before_quiet_period_ends_restarts_it() {
    let mut d = Debouncer::new(POLL, QUIET);
    let t0 = Instant::now();
    d.start();

    assert_eq!(d.observe(t0, modified("A.java")), None);
    assert_eq!(d.phase(), WatchPhase::Quieting);

    // One millisecond before the quiet period would have completed.
    let t1 = t0 + QUIET - Duration::from_millis(1);
    assert_eq!(d.observe(t1, modified("B.java")), None);

    // Measured from t0 the period is over, but not from t1.
    assert_eq!(d.observe(t0 + QUIET + Duration::from_millis(1), ChangeSet::default()), None);
    assert_eq!(d.phase(), WatchPhase::Quieting);

    let fired = d.observe(t1 + QUIET, ChangeSet::default());
    assert_eq!(fired, Some(modified("B.java")));
    assert_eq!(d.phase(), WatchPhase::Polling);
}

#[test]
fn burst_produces_exactly_one_notification() {
    let mut d = Debouncer::new(Duration::from_millis(100), QUIET);
    let t0 = Instant::now();
    d.start();

    let mut notifications = 0;
    // A change on every 100ms scan for one second, then silence for two.
    for step in 0..30u64 {
        let now = t0 + Duration::from_millis(step * 100);
        let changes = if step < 10 {
            modified(&format!("F{step}.java"))
        } else {
            ChangeSet::default()
        };
        if d.observe(now, changes).is_some() {
            notifications += 1;
        }
    }

    assert_eq!(notifications, 1);
}

#[test]
fn no_changes_means_no_notifications() {
    let mut d = Debouncer::new(POLL, QUIET);
    let t0 = Instant::now();
    d.start();
    for step in 0..10u32 {
        assert_eq!(d.observe(t0 + POLL * step, ChangeSet::default()), None);
    }
    assert_eq!(d.next_deadline(t0), Some(t0 + POLL));
}

fn recording_session(fs: &MockFileSystem) -> (WatchSession, Arc<Mutex<Vec<ChangeSet>>>) {
    let scanner = DirectoryScanner::new(
        Arc::new(fs.clone()),
        vec![PathBuf::from("src/main"), PathBuf::from("src/main/resources")],
    );
    let mut session = WatchSession::new(scanner, POLL, QUIET);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    session.add_listener(move |changes: &ChangeSet| -> anyhow::Result<()> {
        sink.lock().unwrap().push(changes.clone());
        Ok(())
    });
    (session, seen)
}

#[tokio::test(start_paused = true)]
async fn single_edit_is_delivered_once_after_quiet_period() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file_at("src/main/A.java", vec![0u8; 100], 1);

    let (session, seen) = recording_session(&fs);
    let handle = session.spawn();

    // Let the initial scan happen, then edit.
    sleep(Duration::from_secs(1)).await;
    fs.add_file_at("src/main/A.java", vec![0u8; 120], 1);

    // First poll at 5s sees the change; the quiet period runs until 5.8s.
    sleep(Duration::from_millis(4_500)).await;
    assert!(seen.lock().unwrap().is_empty(), "must wait for the quiet period");

    sleep(Duration::from_millis(1_000)).await;
    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], modified("src/main/A.java"));
    }

    // Nothing else changes, so nothing else is delivered.
    sleep(POLL * 4).await;
    assert_eq!(seen.lock().unwrap().len(), 1);

    with_timeout(handle.stop()).await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stopped_watcher_delivers_nothing() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file_at("src/main/A.java", "a", 1);

    let (session, seen) = recording_session(&fs);
    let handle = session.spawn();
    sleep(Duration::from_secs(1)).await;

    with_timeout(handle.stop()).await;

    fs.add_file_at("src/main/B.java", "b", 2);
    sleep(POLL * 3).await;
    assert!(seen.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failing_or_panicking_listener_does_not_stop_the_watcher() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_dir("src/main");

    let (mut session, seen) = recording_session(&fs);
    session.add_listener(|_: &ChangeSet| -> anyhow::Result<()> { anyhow::bail!("listener broke") });
    session.add_listener(|_: &ChangeSet| -> anyhow::Result<()> { panic!("listener panicked") });
    let handle = session.spawn();

    sleep(Duration::from_secs(1)).await;
    fs.add_file_at("src/main/A.java", "a", 1);
    sleep(POLL * 2).await;
    fs.add_file_at("src/main/B.java", "b", 2);
    sleep(POLL * 2).await;

    assert_eq!(seen.lock().unwrap().len(), 2);
    assert!(!handle.is_finished(), "watcher task survived both listeners");
    with_timeout(handle.stop()).await;
    Ok(())
}

#[test]
fn missing_roots_are_skipped() {
    let fs = MockFileSystem::new();
    fs.add_file_at("src/main/java/A.java", "a", 1);

    let scanner = DirectoryScanner::new(
        Arc::new(fs),
        vec![PathBuf::from("src/main"), PathBuf::from("does/not/exist")],
    );
    let snapshot = scanner.scan();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.contains(&PathBuf::from("src/main/java/A.java")));
}
