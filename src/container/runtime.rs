// src/container/runtime.rs

//! Pluggable container runtime abstraction.
//!
//! The lifecycle manager talks to a `ContainerRuntime` instead of the docker
//! binary directly, so tests can count create/start/kill calls with a fake.

use crate::container::spec::ContainerSpec;
use crate::errors::Result;
use crate::types::BoxFuture;

/// What the runtime reports about an existing container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerState {
    pub running: bool,
}

/// The thin subset of a container runtime API the orchestrator needs.
pub trait ContainerRuntime: Send + Sync {
    /// Create (but don't start) a container and return its id.
    ///
    /// Rejections map to `PlugwatchError::ContainerCreationError`.
    fn create<'a>(&'a self, spec: &'a ContainerSpec) -> BoxFuture<'a, Result<String>>;

    /// Rejections map to `PlugwatchError::ContainerStartError`.
    fn start<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>>;

    fn kill<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>>;

    /// `Ok(None)` when the runtime doesn't know the container.
    fn inspect<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<ContainerState>>>;
}
