// src/container/handle.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Lifecycle status of the service container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    Created,
    Running,
    Killed,
}

/// The orchestrator's reference to one runtime-managed container.
///
/// Shared (behind an `Arc`) between the normal shutdown path and the exit
/// hook. The one-shot kill guard makes sure only one of them ever issues the
/// underlying kill.
#[derive(Debug)]
pub struct ContainerHandle {
    id: String,
    status: Mutex<ContainerStatus>,
    kill_claimed: AtomicBool,
}

impl ContainerHandle {
    pub fn new(id: impl Into<String>, status: ContainerStatus) -> Self {
        Self {
            id: id.into(),
            status: Mutex::new(status),
            kill_claimed: AtomicBool::new(status == ContainerStatus::Killed),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> ContainerStatus {
        *self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Killed is terminal: once set, later transitions are ignored.
    pub(crate) fn set_status(&self, status: ContainerStatus) {
        let mut current = self.status.lock().unwrap_or_else(|e| e.into_inner());
        if *current != ContainerStatus::Killed {
            *current = status;
        }
    }

    /// Returns true exactly once: for the first caller that wants to kill.
    pub(crate) fn claim_kill(&self) -> bool {
        !self.kill_claimed.swap(true, Ordering::SeqCst)
    }
}
