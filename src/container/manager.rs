// src/container/manager.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::container::handle::{ContainerHandle, ContainerStatus};
use crate::container::runtime::ContainerRuntime;
use crate::container::spec::ContainerSpec;
use crate::errors::{PlugwatchError, Result};
use crate::fs::FileSystem;

/// How often `wait_until_running` asks the runtime for the container state.
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Recovery file for a task path: `<dir>/<safe task path>-containerId.txt`.
///
/// A leading `:` is dropped and the remaining `:` become `_`, so
/// `:plugin:watch` maps to `plugin_watch-containerId.txt`.
pub fn container_id_file(dir: &Path, task_path: &str) -> PathBuf {
    let safe = task_path.strip_prefix(':').unwrap_or(task_path).replace(':', "_");
    dir.join(format!("{safe}-containerId.txt"))
}

/// Creates, starts and kills the service container for one orchestrator run.
///
/// At most one non-killed container handle exists per manager.
pub struct ContainerManager {
    runtime: Arc<dyn ContainerRuntime>,
    fs: Arc<dyn FileSystem>,
    id_file: PathBuf,
    active: Mutex<Option<Arc<ContainerHandle>>>,
}

impl std::fmt::Debug for ContainerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerManager")
            .field("id_file", &self.id_file)
            .field("active", &self.active())
            .finish_non_exhaustive()
    }
}

impl ContainerManager {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        fs: Arc<dyn FileSystem>,
        id_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runtime,
            fs,
            id_file: id_file.into(),
            active: Mutex::new(None),
        }
    }

    pub fn id_file(&self) -> &Path {
        &self.id_file
    }

    /// The current non-killed handle, if any.
    pub fn active(&self) -> Option<Arc<ContainerHandle>> {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .filter(|h| h.status() != ContainerStatus::Killed)
            .cloned()
    }

    /// Container id left behind by a previous run, if the recovery file exists.
    pub fn recorded_id(&self) -> Option<String> {
        if !self.fs.exists(&self.id_file) {
            return None;
        }
        match self.fs.read_to_string(&self.id_file) {
            Ok(contents) => Some(contents.trim().to_string()).filter(|id| !id.is_empty()),
            Err(err) => {
                warn!(file = ?self.id_file, error = %err, "could not read container id file");
                None
            }
        }
    }

    /// Create the container (without starting it).
    ///
    /// A container recorded by a previous run that the runtime still knows is
    /// reused instead. Otherwise a new one is created and its id written to
    /// the recovery file.
    pub async fn create(&self, spec: &ContainerSpec) -> Result<Arc<ContainerHandle>> {
        if let Some(active) = self.active() {
            return Err(PlugwatchError::ContainerCreationError(format!(
                "container {} is already active for this run",
                active.id()
            )));
        }

        if let Some(handle) = self.recover().await {
            return Ok(self.activate(handle));
        }

        let id = self.runtime.create(spec).await?;
        if let Err(err) = self.fs.write(&self.id_file, id.as_bytes()) {
            warn!(file = ?self.id_file, error = %err, "could not record container id");
        }

        info!(container = %id, "container created");
        Ok(self.activate(ContainerHandle::new(id, ContainerStatus::Created)))
    }

    async fn recover(&self) -> Option<ContainerHandle> {
        let id = self.recorded_id()?;

        match self.runtime.inspect(&id).await {
            Ok(Some(state)) => {
                let status = if state.running {
                    ContainerStatus::Running
                } else {
                    ContainerStatus::Created
                };
                info!(container = %id, ?status, "reusing container from previous run");
                Some(ContainerHandle::new(id, status))
            }
            Ok(None) => {
                debug!(container = %id, "recorded container no longer exists");
                None
            }
            Err(err) => {
                warn!(container = %id, error = %err, "could not inspect recorded container");
                None
            }
        }
    }

    fn activate(&self, handle: ContainerHandle) -> Arc<ContainerHandle> {
        let handle = Arc::new(handle);
        *self.active.lock().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&handle));
        handle
    }

    /// Start a created container. Already-running containers are left alone.
    pub async fn start(&self, handle: &ContainerHandle) -> Result<()> {
        match handle.status() {
            ContainerStatus::Running => {
                debug!(container = %handle.id(), "container already running");
                Ok(())
            }
            ContainerStatus::Killed => Err(PlugwatchError::ContainerStartError(format!(
                "container {} was already killed",
                handle.id()
            ))),
            ContainerStatus::Created => {
                self.runtime.start(handle.id()).await?;
                handle.set_status(ContainerStatus::Running);
                info!(container = %handle.id(), "container started");
                Ok(())
            }
        }
    }

    /// Block until the runtime reports the container running, or `timeout`
    /// elapses.
    pub async fn wait_until_running(&self, handle: &ContainerHandle, timeout: Duration) -> Result<()> {
        let poll = async {
            loop {
                match self.runtime.inspect(handle.id()).await {
                    Ok(Some(state)) if state.running => return Ok(()),
                    Ok(Some(_)) => debug!(container = %handle.id(), "container not running yet"),
                    Ok(None) => {
                        return Err(PlugwatchError::ContainerStartError(format!(
                            "container {} disappeared while starting",
                            handle.id()
                        )));
                    }
                    Err(err) => debug!(container = %handle.id(), error = %err, "inspect failed; retrying"),
                }
                tokio::time::sleep(READY_POLL_INTERVAL).await;
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(Ok(())) => {
                handle.set_status(ContainerStatus::Running);
                info!(container = %handle.id(), "container is running");
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(PlugwatchError::ContainerStartError(format!(
                "container {} not running after {:?}",
                handle.id(),
                timeout
            ))),
        }
    }

    /// Best-effort, idempotent kill.
    ///
    /// Only the first call for a handle reaches the runtime; failures are
    /// logged and swallowed since this runs on teardown paths.
    pub async fn kill(&self, handle: &ContainerHandle) {
        if !handle.claim_kill() {
            debug!(container = %handle.id(), "kill already issued; nothing to do");
            return;
        }

        if let Err(err) = self.runtime.kill(handle.id()).await {
            warn!(container = %handle.id(), error = %err, "failed to kill container");
        } else {
            info!(container = %handle.id(), "container killed");
        }
        handle.set_status(ContainerStatus::Killed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_file_name_is_derived_from_task_path() {
        let dir = Path::new("build/.docker");
        assert_eq!(
            container_id_file(dir, ":plugin:watch"),
            PathBuf::from("build/.docker/plugin_watch-containerId.txt")
        );
        assert_eq!(
            container_id_file(dir, "watch"),
            PathBuf::from("build/.docker/watch-containerId.txt")
        );
    }
}
