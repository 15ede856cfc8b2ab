// src/errors.rs

//! Crate-wide error type and aliases.
//!
//! Errors fall into three propagation classes:
//! - setup errors (config, container creation/start) end the whole run,
//! - per-cycle errors (build, artifact lookup, reload) fail one reload cycle,
//! - teardown errors (kill) are logged and never surfaced.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlugwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("scan error at {path:?}: {message}")]
    ScanError { path: PathBuf, message: String },

    #[error("container creation failed: {0}")]
    ContainerCreationError(String),

    #[error("container start failed: {0}")]
    ContainerStartError(String),

    #[error("build failed with exit code {code}")]
    BuildFailure { code: i32 },

    #[error("no artifact starting with '{prefix}' found in {dir:?}")]
    ArtifactNotFoundError { dir: PathBuf, prefix: String },

    #[error("reload rejected by service (HTTP {status}): {body}")]
    ReloadRejectedError { status: u16, body: String },

    #[error("reload endpoint unreachable after {attempts} attempt(s): {last_error}")]
    ReloadUnreachableError { attempts: u32, last_error: String },

    #[error("reload cycle {cycle_id} failed: {reason}")]
    CycleFailed { cycle_id: u64, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlugwatchError {
    /// True for errors that only fail the current reload cycle.
    pub fn is_cycle_local(&self) -> bool {
        matches!(
            self,
            PlugwatchError::BuildFailure { .. }
                | PlugwatchError::ArtifactNotFoundError { .. }
                | PlugwatchError::ReloadRejectedError { .. }
                | PlugwatchError::ReloadUnreachableError { .. }
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PlugwatchError>;
