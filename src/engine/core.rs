// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! Consumes [`RuntimeEvent`]s and produces commands for the IO shell
//! (`engine::runtime::Runtime`). It owns no channels, spawns nothing and does
//! no IO, so the single-cycle guarantee is tested here without Tokio.

use crate::engine::event_handlers::{
    handle_cycle_finished, handle_cycle_request, CoreStep, CycleSlot,
};
use crate::engine::queue::CycleQueue;
use crate::engine::{CycleId, RuntimeEvent, RuntimeOptions};
use crate::errors::{PlugwatchError, Result};

#[derive(Debug)]
pub struct CoreRuntime {
    slot: CycleSlot,
    queue: CycleQueue,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(queue_length: usize, options: RuntimeOptions) -> Self {
        Self {
            slot: CycleSlot::default(),
            queue: CycleQueue::new(queue_length),
            options,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.slot.active.is_none()
    }

    pub fn active_cycle(&self) -> Option<CycleId> {
        self.slot.active
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// The most recent cycle, if it failed.
    pub fn last_failure(&self) -> Option<(CycleId, &str)> {
        self.slot
            .last_failure
            .as_ref()
            .map(|(id, reason)| (*id, reason.as_str()))
    }

    /// What the run amounts to once the loop has stopped.
    ///
    /// In exit-when-idle mode a failed last cycle is the result of the run;
    /// a long-running watch reports failures as they happen and ends cleanly.
    pub fn exit_status(&self) -> Result<()> {
        match self.last_failure() {
            Some((cycle_id, reason)) if self.options.exit_when_idle => Err(PlugwatchError::CycleFailed {
                cycle_id,
                reason: reason.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::CycleRequested { changes, reason } => {
                handle_cycle_request(&mut self.slot, &mut self.queue, changes, reason)
            }
            RuntimeEvent::CycleFinished { cycle_id, outcome } => handle_cycle_finished(
                &mut self.slot,
                &mut self.queue,
                &self.options,
                cycle_id,
                outcome,
            ),
            RuntimeEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }
}
