// src/orchestrator.rs

//! Top-level wiring: container up, watcher on, cycles through the runtime,
//! container down.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::ConfigFile;
use crate::container::{
    container_id_file, exit_hook, ContainerHandle, ContainerManager, ContainerRuntime, ExitHook,
};
use crate::engine::{CoreRuntime, CycleExecutor, CycleReason, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::watch::{ChangeSet, ChannelListener, DirectoryScanner, WatchSession};

/// Owns the validated config and the container manager for one run.
#[derive(Debug)]
pub struct Orchestrator {
    cfg: ConfigFile,
    fs: Arc<dyn FileSystem>,
    containers: Arc<ContainerManager>,
}

impl Orchestrator {
    pub fn new(cfg: ConfigFile, fs: Arc<dyn FileSystem>, runtime: Arc<dyn ContainerRuntime>) -> Self {
        let id_file = container_id_file(&cfg.container.id_dir, &cfg.container.task_path);
        let containers = Arc::new(ContainerManager::new(runtime, fs.clone(), id_file));
        Self { cfg, fs, containers }
    }

    pub fn config(&self) -> &ConfigFile {
        &self.cfg
    }

    pub fn containers(&self) -> &Arc<ContainerManager> {
        &self.containers
    }

    /// Create and start the service container, then block until it reports
    /// running. A container that was created but never came up is killed
    /// before the error is returned.
    pub async fn start_container(&self) -> Result<Arc<ContainerHandle>> {
        let settings = &self.cfg.container;
        let handle = self.containers.create(&settings.spec).await?;

        let started = async {
            self.containers.start(&handle).await?;
            self.containers
                .wait_until_running(&handle, settings.ready_timeout)
                .await
        }
        .await;

        if let Err(err) = started {
            self.containers.kill(&handle).await;
            return Err(err);
        }

        info!(container = %handle.id(), "container running");
        Ok(handle)
    }

    /// Watch session over the configured roots, forwarding notifications to
    /// the runtime.
    pub fn watch_session(&self, runtime_tx: mpsc::UnboundedSender<RuntimeEvent>) -> Result<WatchSession> {
        let watch = &self.cfg.watch;
        let scanner = DirectoryScanner::new(self.fs.clone(), watch.roots.clone())
            .with_exclude(&watch.exclude)?;
        let mut session = WatchSession::new(scanner, watch.poll_interval, watch.quiet_period);
        session.add_listener(ChannelListener::new(runtime_tx));
        Ok(session)
    }

    /// Run until shutdown (or, with `once`, until one cycle has finished).
    ///
    /// The caller supplies the runtime channel so the executor it built can
    /// report `CycleFinished` on the same channel. Ctrl-C and SIGTERM tear the
    /// container down at any point, including while it is still starting.
    pub async fn run<E: CycleExecutor>(
        &self,
        executor: E,
        runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
        runtime_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
        once: bool,
    ) -> Result<()> {
        self.run_until(executor, runtime_tx, runtime_rx, once, exit_hook::termination())
            .await
    }

    /// [`Orchestrator::run`] with the termination trigger supplied by the
    /// caller.
    pub async fn run_until<E, F>(
        &self,
        executor: E,
        runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
        runtime_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
        once: bool,
        shutdown: F,
    ) -> Result<()>
    where
        E: CycleExecutor,
        F: Future<Output = ()> + Send + 'static,
    {
        // Armed before the container exists so no signal finds it unguarded.
        let hook = ExitHook::new(self.containers.clone()).register_on(shutdown, runtime_tx.clone());

        let handle = tokio::select! {
            started = self.start_container() => match started {
                Ok(handle) => handle,
                Err(err) => {
                    hook.disarm();
                    return Err(err);
                }
            },
            _ = hook.fired() => {
                // A create that finished after the hook ran is caught here.
                if let Some(handle) = self.containers.active() {
                    self.containers.kill(&handle).await;
                }
                info!("terminated before the container was running");
                return Ok(());
            }
        };

        let watcher = if once {
            let _ = runtime_tx.send(RuntimeEvent::CycleRequested {
                changes: ChangeSet::default(),
                reason: CycleReason::Manual,
            });
            None
        } else {
            match self.watch_session(runtime_tx.clone()) {
                Ok(session) => Some(session.spawn()),
                Err(err) => {
                    hook.disarm();
                    self.containers.kill(&handle).await;
                    return Err(err);
                }
            }
        };
        drop(runtime_tx);

        let core = CoreRuntime::new(
            self.cfg.queue_length,
            RuntimeOptions {
                exit_when_idle: once,
            },
        );
        let result = Runtime::new(core, runtime_rx, executor).run().await;

        if let Some(watcher) = watcher {
            watcher.stop().await;
        }
        hook.disarm();
        self.containers.kill(&handle).await;

        if let Err(err) = &result {
            warn!(error = %err, "runtime stopped with error");
        }
        result
    }
}
