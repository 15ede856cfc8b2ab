// src/container/mod.rs

//! Service container lifecycle.
//!
//! - [`spec`]: what to create (image, ports, env, ...).
//! - [`runtime`]: the `ContainerRuntime` seam; [`docker`] implements it with
//!   the docker CLI.
//! - [`manager`]: create / start / kill with the recovery file and the
//!   one-container-per-run rule.
//! - [`exit_hook`]: teardown on Ctrl-C / SIGTERM.

pub mod docker;
pub mod exit_hook;
pub mod handle;
pub mod manager;
pub mod runtime;
pub mod spec;

pub use docker::DockerCli;
pub use exit_hook::{ArmedExitHook, ExitHook};
pub use handle::{ContainerHandle, ContainerStatus};
pub use manager::{container_id_file, ContainerManager};
pub use runtime::{ContainerRuntime, ContainerState};
pub use spec::{ContainerSpec, PortBinding};
