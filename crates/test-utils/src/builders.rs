#![allow(dead_code)]

use std::path::Path;

use plugwatch::config::{
    BuildSection, ConfigFile, ConfigSection, ContainerSection, PluginSection, RawConfigFile,
    ReloadSection, WatchSection,
};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the same defaults an almost-empty `Plugwatch.toml` gets, with
/// short timings so tests don't wait on 5s polls.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(plugin: &str, image: &str) -> Self {
        let mut watch = WatchSection::default();
        watch.poll_interval = "100ms".to_string();
        watch.quiet_period = "300ms".to_string();

        let mut reload = ReloadSection::default();
        reload.backoff = "10ms".to_string();

        let mut container = ContainerSection::new(image);
        container.ready_timeout = "2s".to_string();

        Self {
            config: RawConfigFile {
                plugin: PluginSection::new(plugin),
                watch,
                build: BuildSection::default(),
                container,
                reload,
                config: ConfigSection::default(),
            },
        }
    }

    pub fn with_root(mut self, root: &str) -> Self {
        self.config.watch.roots.push(root.to_string());
        self
    }

    pub fn with_only_root(mut self, root: &str) -> Self {
        self.config.watch.roots = vec![root.to_string()];
        self
    }

    pub fn with_exclude(mut self, pattern: &str) -> Self {
        self.config.watch.exclude.push(pattern.to_string());
        self
    }

    pub fn with_timings(mut self, poll: &str, quiet: &str) -> Self {
        self.config.watch.poll_interval = poll.to_string();
        self.config.watch.quiet_period = quiet.to_string();
        self
    }

    pub fn with_build_cmd(mut self, cmd: &str, args: &[&str]) -> Self {
        self.config.build.cmd = cmd.to_string();
        self.config.build.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.config.build.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_port(mut self, binding: &str) -> Self {
        self.config.container.ports.push(binding.to_string());
        self
    }

    pub fn with_task_path(mut self, task_path: &str) -> Self {
        self.config.container.task_path = task_path.to_string();
        self
    }

    pub fn with_reload_host(mut self, host: &str) -> Self {
        self.config.reload.host = host.to_string();
        self
    }

    pub fn with_retry(mut self, max_attempts: u32, backoff: &str) -> Self {
        self.config.reload.max_attempts = max_attempts;
        self.config.reload.backoff = backoff.to_string();
        self
    }

    pub fn with_queue_length(mut self, len: usize) -> Self {
        self.config.config.queue_length = len;
        self
    }

    /// Escape hatch for fields without a dedicated method.
    pub fn edit(mut self, f: impl FnOnce(&mut RawConfigFile)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    /// Validate with relative paths resolved against `base_dir`.
    pub fn build_in(self, base_dir: &Path) -> ConfigFile {
        ConfigFile::from_raw(self.config, base_dir)
            .expect("Failed to build valid config from builder")
    }
}
