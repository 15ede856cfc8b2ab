// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::cycle::{CycleExecutor, CycleJob};
use crate::errors::Result;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Async shell around [`CoreRuntime`]: reads `RuntimeEvent`s and hands the
/// cycles the core starts to a [`CycleExecutor`].
pub struct Runtime<E: CycleExecutor> {
    core: CoreRuntime,
    event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
    executor: E,
}

impl<E: CycleExecutor> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: CycleExecutor> Runtime<E> {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
        executor: E,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop. Returns when the core asks to stop or every sender is
    /// gone; the result is the core's exit status.
    pub async fn run(mut self) -> Result<()> {
        info!("plugwatch runtime started");

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            debug!(?event, "runtime received event");
            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!("runtime exiting");
        self.core.exit_status()
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::StartCycle {
                cycle_id,
                changes,
                reason,
            } => {
                self.executor
                    .start_cycle(CycleJob {
                        cycle_id,
                        changes,
                        reason,
                    })
                    .await
            }
        }
    }
}
