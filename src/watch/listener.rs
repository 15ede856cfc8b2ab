// src/watch/listener.rs

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;

use crate::engine::{CycleReason, RuntimeEvent};
use crate::watch::change_set::ChangeSet;

/// Subscriber for consolidated change notifications.
///
/// Listeners run on the watcher's own task, one after another, so a slow
/// listener delays the next scan. Errors are logged by the watcher and never
/// stop it.
pub trait ChangeListener: Send {
    fn on_change(&mut self, changes: &ChangeSet) -> Result<()>;
}

impl<F> ChangeListener for F
where
    F: FnMut(&ChangeSet) -> Result<()> + Send,
{
    fn on_change(&mut self, changes: &ChangeSet) -> Result<()> {
        self(changes)
    }
}

/// Listener that forwards every notification to the orchestrator runtime as a
/// `CycleRequested` event.
///
/// The channel is unbounded so a busy reload cycle never stalls the watcher;
/// the runtime's cycle queue bounds what is actually kept.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
}

impl ChannelListener {
    pub fn new(runtime_tx: mpsc::UnboundedSender<RuntimeEvent>) -> Self {
        Self { runtime_tx }
    }
}

impl ChangeListener for ChannelListener {
    fn on_change(&mut self, changes: &ChangeSet) -> Result<()> {
        self.runtime_tx
            .send(RuntimeEvent::CycleRequested {
                changes: changes.clone(),
                reason: CycleReason::FileWatch,
            })
            .map_err(|_| anyhow!("runtime event channel closed"))
    }
}
