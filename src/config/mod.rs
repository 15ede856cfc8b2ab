// src/config/mod.rs

//! Configuration loading and validation for plugwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it and resolve paths/durations into typed settings
//!   (`validate.rs`, `duration.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{config_root_dir, default_config_path, load_and_validate, load_from_path};
pub use model::{
    BuildSection, BuildSettings, ConfigFile, ConfigSection, ContainerSection,
    ContainerSettings, PluginSection, PluginSettings, RawConfigFile, ReloadSection,
    ReloadSettings, WatchSection, WatchSettings,
};
