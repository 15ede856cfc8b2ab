use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use plugwatch::engine::{CycleExecutor, CycleJob, CycleOutcome, RuntimeEvent};
use plugwatch::errors::Result;
use plugwatch::types::BoxFuture;

/// Shared record of every cycle a fake executor was asked to start.
#[derive(Debug, Clone, Default)]
pub struct CycleLog {
    jobs: Arc<Mutex<Vec<CycleJob>>>,
}

impl CycleLog {
    pub fn jobs(&self) -> Vec<CycleJob> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fake cycle executor that:
/// - records which cycles were started
/// - either reports `CycleFinished` immediately (auto mode) or leaves that to
///   the test (manual mode), so mid-cycle behaviour can be observed.
pub struct FakeCycleExecutor {
    runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
    log: CycleLog,
    auto: Option<CycleOutcome>,
}

impl FakeCycleExecutor {
    /// Finish every cycle right away with `outcome`.
    pub fn auto(runtime_tx: mpsc::UnboundedSender<RuntimeEvent>, outcome: CycleOutcome) -> Self {
        Self {
            runtime_tx,
            log: CycleLog::default(),
            auto: Some(outcome),
        }
    }

    /// Record cycles only; the test sends `CycleFinished` itself.
    pub fn manual(runtime_tx: mpsc::UnboundedSender<RuntimeEvent>) -> Self {
        Self {
            runtime_tx,
            log: CycleLog::default(),
            auto: None,
        }
    }

    pub fn log(&self) -> CycleLog {
        self.log.clone()
    }
}

impl CycleExecutor for FakeCycleExecutor {
    fn start_cycle(&mut self, job: CycleJob) -> BoxFuture<'_, Result<()>> {
        self.log.jobs.lock().unwrap().push(job.clone());
        if let Some(outcome) = self.auto.clone() {
            let _ = self.runtime_tx.send(RuntimeEvent::CycleFinished {
                cycle_id: job.cycle_id,
                outcome,
            });
        }
        Box::pin(async { Ok(()) })
    }
}
