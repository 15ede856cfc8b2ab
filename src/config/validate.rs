// src/config/validate.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{
    BuildSettings, ConfigFile, ContainerSettings, PluginSettings, RawConfigFile,
    ReloadSettings, WatchSettings,
};
use crate::container::{ContainerSpec, PortBinding};
use crate::errors::{PlugwatchError, Result};
use crate::reload::{Credentials, RetryPolicy};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PlugwatchError;

    /// Resolve relative paths against the current directory.
    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ConfigFile::from_raw(raw, Path::new("."))
    }
}

impl ConfigFile {
    /// Validate `raw` and resolve every relative path against `base_dir`
    /// (normally the directory holding the config file).
    pub fn from_raw(raw: RawConfigFile, base_dir: &Path) -> Result<Self> {
        validate_raw_config(&raw)?;

        let project_dir = match raw.plugin.project_dir.as_deref() {
            Some(dir) => resolve(base_dir, dir),
            None => base_dir.to_path_buf(),
        };

        let plugin = PluginSettings {
            name: raw.plugin.name.trim().to_string(),
            build_output_dir: resolve(&project_dir, &raw.plugin.build_output_dir),
            artifact_extension: raw
                .plugin
                .artifact_extension
                .trim_start_matches('.')
                .to_string(),
        };

        let watch = WatchSettings {
            roots: raw
                .watch
                .roots
                .iter()
                .map(|r| resolve(&project_dir, r))
                .collect(),
            exclude: raw.watch.exclude.clone(),
            poll_interval: duration_field("[watch].poll_interval", &raw.watch.poll_interval)?,
            quiet_period: duration_field("[watch].quiet_period", &raw.watch.quiet_period)?,
        };

        let mut args = raw.build.args.clone();
        args.extend(
            raw.build
                .properties
                .iter()
                .map(|(key, value)| format!("-P{key}={value}")),
        );
        let build = BuildSettings {
            cmd: raw.build.cmd.clone(),
            args,
            classpath: raw.build.classpath.as_ref().map(|entries| {
                entries.iter().map(|e| resolve(&project_dir, e)).collect()
            }),
        };

        let ports = raw
            .container
            .ports
            .iter()
            .map(|p| p.parse::<PortBinding>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| PlugwatchError::ConfigError(format!("[container].ports: {e}")))?;

        let container = ContainerSettings {
            spec: ContainerSpec {
                image: raw.container.image.trim().to_string(),
                name: raw.container.name.clone(),
                working_dir: raw.container.working_dir.clone(),
                platform: raw.container.platform.clone(),
                ports,
                env: raw.container.env.clone(),
            },
            id_dir: resolve(&project_dir, &raw.container.id_dir),
            task_path: raw.container.task_path.clone(),
            ready_timeout: duration_field(
                "[container].ready_timeout",
                &raw.container.ready_timeout,
            )?,
        };

        let reload = ReloadSettings {
            host: raw.reload.host.trim_end_matches('/').to_string(),
            endpoint: raw.reload.endpoint.clone(),
            credentials: Credentials::new(&raw.reload.username, &raw.reload.password),
            retry: RetryPolicy {
                max_attempts: raw.reload.max_attempts,
                backoff: duration_field("[reload].backoff", &raw.reload.backoff)?,
            },
            request_timeout: duration_field(
                "[reload].request_timeout",
                &raw.reload.request_timeout,
            )?,
        };

        Ok(ConfigFile {
            project_dir,
            plugin,
            watch,
            build,
            container,
            reload,
            queue_length: raw.config.queue_length,
        })
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_plugin(cfg)?;
    validate_watch(cfg)?;
    validate_container(cfg)?;
    validate_reload(cfg)?;
    validate_global_config(cfg)?;
    Ok(())
}

fn validate_plugin(cfg: &RawConfigFile) -> Result<()> {
    if cfg.plugin.name.trim().is_empty() {
        return Err(PlugwatchError::ConfigError(
            "[plugin].name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.roots.is_empty() {
        return Err(PlugwatchError::ConfigError(
            "[watch].roots must list at least one directory".to_string(),
        ));
    }

    let poll = duration_field("[watch].poll_interval", &cfg.watch.poll_interval)?;
    if poll.is_zero() {
        return Err(PlugwatchError::ConfigError(
            "[watch].poll_interval must be greater than zero".to_string(),
        ));
    }

    for pattern in cfg.watch.exclude.iter() {
        globset::Glob::new(pattern).map_err(|e| {
            PlugwatchError::ConfigError(format!(
                "[watch].exclude has invalid pattern '{pattern}': {e}"
            ))
        })?;
    }
    Ok(())
}

fn validate_container(cfg: &RawConfigFile) -> Result<()> {
    if cfg.container.image.trim().is_empty() {
        return Err(PlugwatchError::ConfigError(
            "[container].image must not be empty".to_string(),
        ));
    }
    if cfg.container.task_path.trim().is_empty() {
        return Err(PlugwatchError::ConfigError(
            "[container].task_path must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_reload(cfg: &RawConfigFile) -> Result<()> {
    if cfg.reload.max_attempts == 0 {
        return Err(PlugwatchError::ConfigError(
            "[reload].max_attempts must be >= 1 (got 0)".to_string(),
        ));
    }
    if !cfg.reload.host.starts_with("http://") && !cfg.reload.host.starts_with("https://") {
        return Err(PlugwatchError::ConfigError(format!(
            "[reload].host must be an http(s) URL (got '{}')",
            cfg.reload.host
        )));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.queue_length == 0 {
        return Err(PlugwatchError::ConfigError(
            "[config].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn duration_field(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| PlugwatchError::ConfigError(format!("{field}: {e}")))
}

fn resolve(base: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
