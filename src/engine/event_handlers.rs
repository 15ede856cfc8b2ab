// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info, warn};

use crate::engine::queue::CycleQueue;
use crate::engine::{CycleId, CycleOutcome, CycleReason, RuntimeOptions};
use crate::watch::ChangeSet;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Hand this cycle to the executor.
    StartCycle {
        cycle_id: CycleId,
        changes: ChangeSet,
        reason: CycleReason,
    },
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn idle() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }

    pub(crate) fn start(cycle_id: CycleId, changes: ChangeSet, reason: CycleReason) -> Self {
        Self {
            commands: vec![CoreCommand::StartCycle {
                cycle_id,
                changes,
                reason,
            }],
            keep_running: true,
        }
    }
}

/// Cycle bookkeeping shared by the handlers.
#[derive(Debug, Default)]
pub(crate) struct CycleSlot {
    pub active: Option<CycleId>,
    pub next_id: CycleId,
    /// Set by a failed cycle, cleared by the next successful one.
    pub last_failure: Option<(CycleId, String)>,
}

impl CycleSlot {
    fn begin(&mut self) -> CycleId {
        self.next_id += 1;
        self.active = Some(self.next_id);
        self.next_id
    }
}

/// Handle a cycle request.
///
/// - Nothing running: start a cycle right away.
/// - A cycle is running: queue the request; it runs after the current one.
pub(crate) fn handle_cycle_request(
    slot: &mut CycleSlot,
    queue: &mut CycleQueue,
    changes: ChangeSet,
    reason: CycleReason,
) -> CoreStep {
    if let Some(active) = slot.active {
        debug!(active_cycle = active, ?reason, %changes, "cycle in progress; queueing request");
        queue.push(changes, reason);
        return CoreStep::idle();
    }

    let cycle_id = slot.begin();
    info!(cycle_id, ?reason, %changes, "starting reload cycle");
    CoreStep::start(cycle_id, changes, reason)
}

/// Handle a finished cycle: free the slot, then start the next queued cycle
/// or, in exit-when-idle mode, stop.
pub(crate) fn handle_cycle_finished(
    slot: &mut CycleSlot,
    queue: &mut CycleQueue,
    options: &RuntimeOptions,
    cycle_id: CycleId,
    outcome: CycleOutcome,
) -> CoreStep {
    if slot.active != Some(cycle_id) {
        warn!(cycle_id, active = ?slot.active, "completion for unknown cycle; ignoring");
        return CoreStep::idle();
    }
    slot.active = None;

    match outcome {
        CycleOutcome::Succeeded => {
            info!(cycle_id, "reload cycle succeeded");
            slot.last_failure = None;
        }
        CycleOutcome::Failed(reason) => {
            if options.exit_when_idle {
                warn!(cycle_id, %reason, "reload cycle failed");
            } else {
                warn!(cycle_id, %reason, "reload cycle failed; waiting for next change");
            }
            slot.last_failure = Some((cycle_id, reason));
        }
    }

    if let Some(next) = queue.pop() {
        let next_id = slot.begin();
        info!(cycle_id = next_id, reason = ?next.reason, changes = %next.changes, "starting queued reload cycle");
        return CoreStep::start(next_id, next.changes, next.reason);
    }

    if options.exit_when_idle {
        info!("idle with nothing queued; exiting");
        return CoreStep {
            commands: Vec::new(),
            keep_running: false,
        };
    }

    CoreStep::idle()
}
