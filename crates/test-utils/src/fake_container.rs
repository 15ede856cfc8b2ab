use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use plugwatch::container::{ContainerRuntime, ContainerSpec, ContainerState};
use plugwatch::errors::{PlugwatchError, Result};
use plugwatch::types::BoxFuture;

#[derive(Debug, Default)]
struct FakeState {
    /// id → running
    containers: HashMap<String, bool>,
    next_id: u32,
    creates: u32,
    starts: u32,
    kills: u32,
    fail_create: Option<String>,
    fail_start: Option<String>,
    stuck_on_start: bool,
}

/// An in-memory container runtime that:
/// - hands out ids `fake-1`, `fake-2`, ...
/// - counts create/start/kill calls
/// - can be told to reject creates or starts, or to never report running.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeContainerRuntime {
    state: Arc<Mutex<FakeState>>,
}

impl FakeContainerRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Pretend a container from an earlier run still exists.
    pub fn with_existing(self, id: &str, running: bool) -> Self {
        self.lock().containers.insert(id.to_string(), running);
        self
    }

    pub fn fail_create(self, message: &str) -> Self {
        self.lock().fail_create = Some(message.to_string());
        self
    }

    pub fn fail_start(self, message: &str) -> Self {
        self.lock().fail_start = Some(message.to_string());
        self
    }

    /// `start` succeeds but `inspect` keeps reporting "not running".
    pub fn stuck_on_start(self) -> Self {
        self.lock().stuck_on_start = true;
        self
    }

    pub fn creates(&self) -> u32 {
        self.lock().creates
    }

    pub fn starts(&self) -> u32 {
        self.lock().starts
    }

    pub fn kills(&self) -> u32 {
        self.lock().kills
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.lock().containers.get(id).copied().unwrap_or(false)
    }
}

impl ContainerRuntime for FakeContainerRuntime {
    fn create<'a>(&'a self, _spec: &'a ContainerSpec) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let mut state = self.lock();
            state.creates += 1;
            if let Some(msg) = state.fail_create.clone() {
                return Err(PlugwatchError::ContainerCreationError(msg));
            }
            state.next_id += 1;
            let id = format!("fake-{}", state.next_id);
            state.containers.insert(id.clone(), false);
            Ok(id)
        })
    }

    fn start<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut state = self.lock();
            state.starts += 1;
            if let Some(msg) = state.fail_start.clone() {
                return Err(PlugwatchError::ContainerStartError(msg));
            }
            let stuck = state.stuck_on_start;
            match state.containers.get_mut(id) {
                Some(running) => {
                    *running = !stuck;
                    Ok(())
                }
                None => Err(PlugwatchError::ContainerStartError(format!("no such container: {id}"))),
            }
        })
    }

    fn kill<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut state = self.lock();
            state.kills += 1;
            if let Some(running) = state.containers.get_mut(id) {
                *running = false;
            }
            Ok(())
        })
    }

    fn inspect<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<ContainerState>>> {
        Box::pin(async move {
            Ok(self
                .lock()
                .containers
                .get(id)
                .map(|running| ContainerState { running: *running }))
        })
    }
}
