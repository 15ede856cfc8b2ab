// src/container/exit_hook.rs

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::container::manager::ContainerManager;
use crate::engine::RuntimeEvent;

/// Guaranteed container teardown when the process is asked to terminate.
///
/// The hook is armed on the manager rather than on a handle, so it can be
/// installed before the container exists and kills whatever container is
/// active when it fires. Kills go through the manager, so the hook is a no-op
/// if the normal shutdown path already ran (and vice versa).
#[derive(Debug, Clone)]
pub struct ExitHook {
    manager: Arc<ContainerManager>,
}

impl ExitHook {
    pub fn new(manager: Arc<ContainerManager>) -> Self {
        Self { manager }
    }

    /// Run the teardown now.
    pub async fn fire(&self) {
        match self.manager.active() {
            Some(handle) => self.manager.kill(&handle).await,
            None => debug!("exit hook fired with no active container"),
        }
    }

    /// Listen for Ctrl-C (and SIGTERM on unix).
    pub fn register(self, runtime_tx: mpsc::UnboundedSender<RuntimeEvent>) -> ArmedExitHook {
        self.register_on(termination(), runtime_tx)
    }

    /// Fire once `trigger` completes: kill the active container, then ask the
    /// runtime to shut down.
    pub fn register_on<F>(self, trigger: F, runtime_tx: mpsc::UnboundedSender<RuntimeEvent>) -> ArmedExitHook
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (fired_tx, fired_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            trigger.await;
            info!("termination requested; tearing down container");
            self.fire().await;
            let _ = fired_tx.send(true);
            let _ = runtime_tx.send(RuntimeEvent::ShutdownRequested);
        });

        ArmedExitHook {
            task,
            fired: fired_rx,
        }
    }
}

/// A registered [`ExitHook`] waiting for its trigger.
#[derive(Debug)]
pub struct ArmedExitHook {
    task: JoinHandle<()>,
    fired: watch::Receiver<bool>,
}

impl ArmedExitHook {
    pub fn has_fired(&self) -> bool {
        *self.fired.borrow()
    }

    /// Resolves after the hook has torn the container down. Never resolves if
    /// the hook is disarmed first.
    pub async fn fired(&self) {
        let mut fired = self.fired.clone();
        let dropped = fired.wait_for(|f| *f).await.is_err();
        if dropped {
            std::future::pending::<()>().await;
        }
    }

    pub fn disarm(&self) {
        self.task.abort();
    }
}

/// Completes on the first Ctrl-C or SIGTERM. If the listeners cannot be
/// installed the failure is logged and this never completes.
pub async fn termination() {
    if let Err(err) = wait_for_signal().await {
        warn!(error = %err, "failed to listen for termination signals");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = term.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
