// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::container::ContainerSpec;
use crate::reload::{Credentials, RetryPolicy};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [plugin]
/// name = "plugin-starter"
///
/// [watch]
/// roots = ["src/main", "src/main/resources"]
/// poll_interval = "5s"
/// quiet_period = "800ms"
///
/// [build]
/// cmd = "./gradlew"
/// args = ["build"]
///
/// [container]
/// image = "halohub/halo:2.20"
/// ports = ["8090:8090"]
///
/// [reload]
/// host = "http://localhost:8090"
/// username = "admin"
/// password = "123456"
/// ```
///
/// Only `[plugin].name` and `[container].image` are required.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub plugin: PluginSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub build: BuildSection,

    pub container: ContainerSection,

    #[serde(default)]
    pub reload: ReloadSection,

    #[serde(default)]
    pub config: ConfigSection,
}

/// `[plugin]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginSection {
    /// Plugin identifier; also the file name prefix of the built artifact.
    pub name: String,

    /// Project directory, relative to the config file's directory.
    #[serde(default)]
    pub project_dir: Option<String>,

    /// Directory the build writes the plugin artifact into, relative to the
    /// project directory.
    #[serde(default = "default_build_output_dir")]
    pub build_output_dir: String,

    /// Artifact file extension, without the dot.
    #[serde(default = "default_artifact_extension")]
    pub artifact_extension: String,
}

impl PluginSection {
    /// Section with every optional key at its default.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_dir: None,
            build_output_dir: default_build_output_dir(),
            artifact_extension: default_artifact_extension(),
        }
    }
}

fn default_build_output_dir() -> String {
    "build/libs".to_string()
}

fn default_artifact_extension() -> String {
    "jar".to_string()
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Directories to poll, relative to the project directory. Missing ones
    /// are skipped.
    #[serde(default = "default_watch_roots")]
    pub roots: Vec<String>,

    /// Glob patterns (relative to each root) for files to ignore.
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    #[serde(default = "default_quiet_period")]
    pub quiet_period: String,
}

fn default_watch_roots() -> Vec<String> {
    vec!["src/main".to_string(), "src/main/resources".to_string()]
}

fn default_poll_interval() -> String {
    "5s".to_string()
}

fn default_quiet_period() -> String {
    "800ms".to_string()
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            roots: default_watch_roots(),
            exclude: Vec::new(),
            poll_interval: default_poll_interval(),
            quiet_period: default_quiet_period(),
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Shell command that runs the build.
    #[serde(default = "default_build_cmd")]
    pub cmd: String,

    /// Arguments appended to `cmd`.
    #[serde(default = "default_build_args")]
    pub args: Vec<String>,

    /// Project properties, passed as `-P<key>=<value>`.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    /// Optional classpath injected into the build via `CLASSPATH`.
    #[serde(default)]
    pub classpath: Option<Vec<String>>,
}

fn default_build_cmd() -> String {
    "./gradlew".to_string()
}

fn default_build_args() -> Vec<String> {
    vec!["build".to_string()]
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            cmd: default_build_cmd(),
            args: default_build_args(),
            properties: BTreeMap::new(),
            classpath: None,
        }
    }
}

/// `[container]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerSection {
    pub image: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub working_dir: Option<String>,

    /// Target platform, `os[/arch[/variant]]`.
    #[serde(default)]
    pub platform: Option<String>,

    /// `"host:container"` port bindings.
    #[serde(default = "default_ports")]
    pub ports: Vec<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Directory holding container-id recovery files, relative to the project
    /// directory.
    #[serde(default = "default_id_dir")]
    pub id_dir: String,

    /// Stable task path the recovery file is keyed by.
    #[serde(default = "default_task_path")]
    pub task_path: String,

    #[serde(default = "default_ready_timeout")]
    pub ready_timeout: String,
}

impl ContainerSection {
    /// Section with every optional key at its default.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            name: None,
            working_dir: None,
            platform: None,
            ports: default_ports(),
            env: BTreeMap::new(),
            id_dir: default_id_dir(),
            task_path: default_task_path(),
            ready_timeout: default_ready_timeout(),
        }
    }
}

fn default_ports() -> Vec<String> {
    vec!["8090:8090".to_string()]
}

fn default_id_dir() -> String {
    "build/.docker".to_string()
}

fn default_task_path() -> String {
    ":watch".to_string()
}

fn default_ready_timeout() -> String {
    "60s".to_string()
}

/// `[reload]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ReloadSection {
    #[serde(default = "default_host")]
    pub host: String,

    /// Endpoint path; `{name}` is replaced by the plugin name.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_password")]
    pub password: String,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff")]
    pub backoff: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
}

fn default_host() -> String {
    "http://localhost:8090".to_string()
}

fn default_endpoint() -> String {
    "/apis/api.console.halo.run/v1alpha1/plugins/{name}/upgrade".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "123456".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff() -> String {
    "2s".to_string()
}

fn default_request_timeout() -> String {
    "30s".to_string()
}

impl Default for ReloadSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            endpoint: default_endpoint(),
            username: default_username(),
            password: default_password(),
            max_attempts: default_max_attempts(),
            backoff: default_backoff(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of reload cycles remembered while one is running.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,
}

fn default_queue_length() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            queue_length: default_queue_length(),
        }
    }
}

/// Validated configuration with paths resolved and durations parsed.
///
/// Built from a [`RawConfigFile`] by [`ConfigFile::from_raw`] (see
/// `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub project_dir: PathBuf,
    pub plugin: PluginSettings,
    pub watch: WatchSettings,
    pub build: BuildSettings,
    pub container: ContainerSettings,
    pub reload: ReloadSettings,
    pub queue_length: usize,
}

#[derive(Debug, Clone)]
pub struct PluginSettings {
    pub name: String,
    pub build_output_dir: PathBuf,
    pub artifact_extension: String,
}

#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub roots: Vec<PathBuf>,
    pub exclude: Vec<String>,
    pub poll_interval: Duration,
    pub quiet_period: Duration,
}

#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub cmd: String,
    pub args: Vec<String>,
    pub classpath: Option<Vec<PathBuf>>,
}

#[derive(Debug, Clone)]
pub struct ContainerSettings {
    pub spec: ContainerSpec,
    pub id_dir: PathBuf,
    pub task_path: String,
    pub ready_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ReloadSettings {
    pub host: String,
    pub endpoint: String,
    pub credentials: Credentials,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
}
