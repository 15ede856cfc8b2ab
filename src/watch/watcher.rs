// src/watch/watcher.rs

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::watch::change_set::{diff, ChangeSet};
use crate::watch::debounce::{Debouncer, WatchPhase};
use crate::watch::listener::ChangeListener;
use crate::watch::scanner::DirectoryScanner;
use crate::watch::snapshot::Snapshot;

/// State owned by one watch run: the reference snapshot, the debounce state
/// machine and the registered listeners.
///
/// Only the watcher loop mutates it once [`WatchSession::spawn`] has been
/// called; the session moves into that task and is dropped when it ends.
pub struct WatchSession {
    scanner: DirectoryScanner,
    reference: Snapshot,
    debouncer: Debouncer,
    listeners: Vec<Box<dyn ChangeListener>>,
}

impl std::fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("scanner", &self.scanner)
            .field("phase", &self.debouncer.phase())
            .field("files", &self.reference.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl WatchSession {
    pub fn new(scanner: DirectoryScanner, poll_interval: Duration, quiet_period: Duration) -> Self {
        Self {
            scanner,
            reference: Snapshot::empty(),
            debouncer: Debouncer::new(poll_interval, quiet_period),
            listeners: Vec::new(),
        }
    }

    pub fn add_listener(&mut self, listener: impl ChangeListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn phase(&self) -> WatchPhase {
        self.debouncer.phase()
    }

    pub fn reference(&self) -> &Snapshot {
        &self.reference
    }

    /// Take the initial snapshot and start polling.
    pub fn start(&mut self) {
        if self.debouncer.phase() != WatchPhase::Idle {
            return;
        }
        let initial = self.scanner.scan();
        self.start_from(initial);
    }

    fn start_from(&mut self, initial: Snapshot) {
        self.reference = initial;
        self.debouncer.start();
        info!(
            roots = ?self.scanner.roots(),
            files = self.reference.len(),
            "watching for changes"
        );
    }

    /// Scan once at `now`, advance the reference snapshot on change and notify
    /// listeners if a quiet period just completed.
    ///
    /// Returns the change set that was delivered, if any.
    pub fn poll(&mut self, now: Instant) -> Option<ChangeSet> {
        if !self.is_polling() {
            return None;
        }
        let snapshot = self.scanner.scan();
        self.observe(now, snapshot)
    }

    fn is_polling(&self) -> bool {
        !matches!(self.phase(), WatchPhase::Idle | WatchPhase::Stopped)
    }

    fn observe(&mut self, now: Instant, snapshot: Snapshot) -> Option<ChangeSet> {
        let changes = diff(&self.reference, &snapshot);
        if !changes.is_empty() {
            debug!(%changes, "scan found changes");
            self.reference = snapshot;
        }

        let ready = self.debouncer.observe(now, changes)?;
        self.notify(&ready);
        Some(ready)
    }

    /// Stop polling and release listeners.
    pub fn stop(&mut self) {
        self.debouncer.stop();
        self.listeners.clear();
    }

    fn next_deadline(&self, now: Instant) -> Option<Instant> {
        self.debouncer.next_deadline(now)
    }

    fn notify(&mut self, changes: &ChangeSet) {
        info!(changed = changes.len(), %changes, "files changed");
        for (idx, listener) in self.listeners.iter_mut().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| listener.on_change(changes))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(listener = idx, error = %err, "change listener failed");
                }
                Err(_) => {
                    error!(listener = idx, "change listener panicked");
                }
            }
        }
    }

    /// Move the session onto a background task that polls until stopped.
    pub fn spawn(mut self) -> WatcherHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            if self.phase() == WatchPhase::Idle {
                let Some(initial) = scan_blocking(&self.scanner).await else {
                    return;
                };
                self.start_from(initial);
            }

            while let Some(deadline) = self.next_deadline(Instant::now()) {
                tokio::select! {
                    _ = sleep_until(deadline) => {}
                    // Either an explicit stop or the handle being dropped.
                    _ = stop_rx.changed() => break,
                }
                if !self.is_polling() {
                    continue;
                }
                if let Some(snapshot) = scan_blocking(&self.scanner).await {
                    self.observe(Instant::now(), snapshot);
                }
            }

            self.stop();
            debug!("watcher loop finished");
        });

        WatcherHandle {
            stop_tx,
            task: Some(task),
        }
    }
}

/// Walk the roots on the blocking pool so a large tree does not hold up a
/// runtime worker. `None` if the scan task panicked.
async fn scan_blocking(scanner: &DirectoryScanner) -> Option<Snapshot> {
    let scanner = scanner.clone();
    match tokio::task::spawn_blocking(move || scanner.scan()).await {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            error!(error = %err, "directory scan task failed");
            None
        }
    }
}

/// Handle for the background watcher loop.
///
/// Dropping this handle stops polling.
pub struct WatcherHandle {
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish_non_exhaustive()
    }
}

impl WatcherHandle {
    /// True once the background loop has ended.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|task| task.is_finished())
    }

    /// Stop the loop and wait for it to finish. No scans or notifications
    /// happen after this returns.
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "watcher task ended abnormally");
            }
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
    }
}
