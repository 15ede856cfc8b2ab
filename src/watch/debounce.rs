// src/watch/debounce.rs

//! Pure debounce state machine for the polling watcher.
//!
//! Timestamps are passed in explicitly, so the quiet-period rules can be
//! exercised without sleeping. The async loop in [`super::watcher`] feeds it
//! the wall clock.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::watch::change_set::ChangeSet;

/// Observable phase of the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    /// Not started yet; no scans are scheduled.
    Idle,
    /// Scanning every poll interval; nothing pending.
    Polling,
    /// A change was seen; waiting out the quiet period before notifying.
    Quieting,
    /// Terminal. No further scans or notifications.
    Stopped,
}

#[derive(Debug, Clone)]
enum State {
    Idle,
    Polling,
    Quieting {
        last_change: Instant,
        latest: ChangeSet,
    },
    Stopped,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    poll_interval: Duration,
    quiet_period: Duration,
    state: State,
}

impl Debouncer {
    pub fn new(poll_interval: Duration, quiet_period: Duration) -> Self {
        Self {
            poll_interval,
            quiet_period,
            state: State::Idle,
        }
    }

    pub fn phase(&self) -> WatchPhase {
        match self.state {
            State::Idle => WatchPhase::Idle,
            State::Polling => WatchPhase::Polling,
            State::Quieting { .. } => WatchPhase::Quieting,
            State::Stopped => WatchPhase::Stopped,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Idle -> Polling. Has no effect in any other phase.
    pub fn start(&mut self) {
        if matches!(self.state, State::Idle) {
            self.state = State::Polling;
        }
    }

    /// Any phase -> Stopped. A pending notification is discarded.
    pub fn stop(&mut self) {
        self.state = State::Stopped;
    }

    /// Feed the result of a scan taken at `now`.
    ///
    /// Returns the change set to hand to listeners when a full quiet period
    /// has passed since the last non-empty scan.
    pub fn observe(&mut self, now: Instant, changes: ChangeSet) -> Option<ChangeSet> {
        match &mut self.state {
            State::Idle | State::Stopped => None,
            State::Polling => {
                if !changes.is_empty() {
                    debug!(changed = changes.len(), "change observed; entering quiet period");
                    self.state = State::Quieting {
                        last_change: now,
                        latest: changes,
                    };
                }
                None
            }
            State::Quieting {
                last_change,
                latest,
            } => {
                if !changes.is_empty() {
                    trace!(changed = changes.len(), "further change; quiet period restarted");
                    *last_change = now;
                    *latest = changes;
                    return None;
                }

                if now.saturating_duration_since(*last_change) < self.quiet_period {
                    return None;
                }

                let latest = std::mem::take(latest);
                self.state = State::Polling;
                Some(latest)
            }
        }
    }

    /// When the next scan should run, or `None` if no scan is scheduled.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        match &self.state {
            State::Idle | State::Stopped => None,
            State::Polling => Some(now + self.poll_interval),
            State::Quieting { last_change, .. } => {
                let quiet_end = *last_change + self.quiet_period;
                Some(quiet_end.min(now + self.poll_interval).max(now))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn changed(path: &str) -> ChangeSet {
        ChangeSet {
            modified: BTreeSet::from([PathBuf::from(path)]),
            ..ChangeSet::default()
        }
    }

    #[test]
    fn idle_and_stopped_ignore_scans() {
        let mut d = Debouncer::new(Duration::from_secs(1), Duration::from_millis(100));
        let t0 = Instant::now();

        assert_eq!(d.observe(t0, changed("a")), None);
        assert_eq!(d.phase(), WatchPhase::Idle);
        assert_eq!(d.next_deadline(t0), None);

        d.start();
        d.stop();
        assert_eq!(d.observe(t0, changed("a")), None);
        assert_eq!(d.phase(), WatchPhase::Stopped);
        assert_eq!(d.next_deadline(t0), None);
    }

    #[test]
    fn quieting_deadline_is_capped_by_poll_interval() {
        let mut d = Debouncer::new(Duration::from_millis(100), Duration::from_millis(800));
        let t0 = Instant::now();
        d.start();
        assert_eq!(d.next_deadline(t0), Some(t0 + Duration::from_millis(100)));

        d.observe(t0, changed("a"));
        assert_eq!(d.next_deadline(t0), Some(t0 + Duration::from_millis(100)));

        let later = t0 + Duration::from_millis(750);
        assert_eq!(d.next_deadline(later), Some(t0 + Duration::from_millis(800)));
    }
}
