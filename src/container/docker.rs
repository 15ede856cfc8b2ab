// src/container/docker.rs

use std::process::{Output, Stdio};

use anyhow::{anyhow, Context};
use tokio::process::Command;
use tracing::{debug, info};

use crate::container::runtime::{ContainerRuntime, ContainerState};
use crate::container::spec::ContainerSpec;
use crate::errors::{PlugwatchError, Result};
use crate::types::BoxFuture;

/// `ContainerRuntime` backed by the `docker` command-line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    /// Use `program` instead of `docker` (e.g. `podman`).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[String]) -> anyhow::Result<Output> {
        debug!(program = %self.program, ?args, "running container client");
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("spawning '{}'", self.program))
    }
}

/// Arguments for `docker create`, in the order the client expects them.
pub fn create_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec!["create".to_string()];

    if let Some(name) = &spec.name {
        args.push("--name".into());
        args.push(name.clone());
    }
    if let Some(dir) = &spec.working_dir {
        args.push("--workdir".into());
        args.push(dir.clone());
    }
    if let Some(platform) = &spec.platform {
        args.push("--platform".into());
        args.push(platform.clone());
    }
    for port in spec.ports.iter() {
        args.push("--expose".into());
        args.push(port.container.to_string());
        args.push("--publish".into());
        args.push(port.to_string());
    }
    for (key, value) in spec.env.iter() {
        args.push("--env".into());
        args.push(format!("{key}={value}"));
    }

    args.push(spec.image.clone());
    args
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

impl ContainerRuntime for DockerCli {
    fn create<'a>(&'a self, spec: &'a ContainerSpec) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            let output = self
                .run(&create_args(spec))
                .await
                .map_err(|e| PlugwatchError::ContainerCreationError(format!("{e:#}")))?;

            if !output.status.success() {
                return Err(PlugwatchError::ContainerCreationError(stderr_of(&output)));
            }

            let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if id.is_empty() {
                return Err(PlugwatchError::ContainerCreationError(
                    "container client returned no id".to_string(),
                ));
            }
            info!(container = %id, image = %spec.image, "created container");
            Ok(id)
        })
    }

    fn start<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let output = self
                .run(&["start".to_string(), id.to_string()])
                .await
                .map_err(|e| PlugwatchError::ContainerStartError(format!("{e:#}")))?;

            if !output.status.success() {
                return Err(PlugwatchError::ContainerStartError(stderr_of(&output)));
            }
            Ok(())
        })
    }

    fn kill<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let output = self.run(&["kill".to_string(), id.to_string()]).await?;
            if !output.status.success() {
                return Err(anyhow!("docker kill {id}: {}", stderr_of(&output)).into());
            }
            Ok(())
        })
    }

    fn inspect<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Option<ContainerState>>> {
        Box::pin(async move {
            let args = [
                "inspect".to_string(),
                "--format".to_string(),
                "{{.State.Running}}".to_string(),
                id.to_string(),
            ];
            let output = self.run(&args).await?;

            if !output.status.success() {
                let stderr = stderr_of(&output);
                if stderr.to_lowercase().contains("no such") {
                    return Ok(None);
                }
                return Err(anyhow!("docker inspect {id}: {stderr}").into());
            }

            let running = String::from_utf8_lossy(&output.stdout).trim() == "true";
            Ok(Some(ContainerState { running }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::spec::PortBinding;

    #[test]
    fn create_args_carry_optional_settings_ports_and_env() {
        let mut spec = ContainerSpec::new("halohub/halo:2.20");
        spec.name = Some("halo-dev".into());
        spec.platform = Some("linux/amd64".into());
        spec.ports = vec![PortBinding {
            host: 8090,
            container: 8090,
        }];
        spec.env
            .insert("HALO_EXTERNAL_URL".into(), "http://localhost:8090/".into());

        let args = create_args(&spec);

        assert_eq!(
            args,
            vec![
                "create",
                "--name",
                "halo-dev",
                "--platform",
                "linux/amd64",
                "--expose",
                "8090",
                "--publish",
                "8090:8090",
                "--env",
                "HALO_EXTERNAL_URL=http://localhost:8090/",
                "halohub/halo:2.20",
            ]
        );
    }

    #[test]
    fn minimal_spec_is_just_the_image() {
        assert_eq!(create_args(&ContainerSpec::new("img")), vec!["create", "img"]);
    }

    #[tokio::test]
    async fn missing_client_binary_is_a_creation_error() {
        let cli = DockerCli::new("plugwatch-definitely-not-a-binary");
        let err = cli.create(&ContainerSpec::new("img")).await.unwrap_err();
        assert!(matches!(err, PlugwatchError::ContainerCreationError(_)));
    }
}
