// src/engine/queue.rs

use std::collections::VecDeque;

use tracing::debug;

use crate::engine::CycleReason;
use crate::watch::ChangeSet;

/// A cycle waiting for the active one to finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCycle {
    pub changes: ChangeSet,
    pub reason: CycleReason,
}

/// Cycle requests that arrive while a reload cycle is already running.
///
/// `queue_length` bounds how many future cycles are remembered (default 1,
/// i.e. "run once more after the current cycle"). When the queue is full a
/// new request is folded into the newest entry, so no changed path is lost;
/// it just rides along with a cycle that was already going to happen.
#[derive(Debug)]
pub struct CycleQueue {
    max_len: usize,
    pending: VecDeque<PendingCycle>,
}

impl CycleQueue {
    /// `max_len` is clamped to at least 1.
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
            pending: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn push(&mut self, changes: ChangeSet, reason: CycleReason) {
        if self.pending.len() >= self.max_len {
            if let Some(last) = self.pending.back_mut() {
                last.changes.absorb(changes);
                // A manual request outranks a file-watch one for logging.
                if reason == CycleReason::Manual {
                    last.reason = reason;
                }
                debug!(queued = self.pending.len(), "merged cycle request into last queued cycle");
                return;
            }
        }

        self.pending.push_back(PendingCycle { changes, reason });
        debug!(queued = self.pending.len(), "queued cycle request");
    }

    pub fn pop(&mut self) -> Option<PendingCycle> {
        self.pending.pop_front()
    }
}
