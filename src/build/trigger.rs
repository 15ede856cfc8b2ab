// src/build/trigger.rs

//! External build invocation.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{PlugwatchError, Result};
use crate::types::BoxFuture;

/// Inputs for one build run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildParameters {
    pub project_dir: PathBuf,
    pub injected_classpath: Option<Vec<PathBuf>>,
    pub build_args: Vec<String>,
}

/// Runs the build and resolves once it has finished.
pub trait BuildTrigger: Send + Sync {
    fn run<'a>(&'a self, params: &'a BuildParameters) -> BoxFuture<'a, Result<()>>;
}

/// Runs the configured build command through the platform shell.
#[derive(Debug, Clone)]
pub struct CommandBuildTrigger {
    cmd: String,
}

impl CommandBuildTrigger {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }

    /// Full shell line: the command followed by every argument, quoted.
    pub fn command_line(&self, args: &[String]) -> String {
        let mut line = self.cmd.clone();
        for arg in args {
            line.push(' ');
            line.push_str(&shell_quote(arg));
        }
        line
    }

    async fn run_inner(&self, params: &BuildParameters) -> Result<()> {
        let line = self.command_line(&params.build_args);
        info!(cmd = %line, dir = ?params.project_dir, "starting build");

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&line);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&line);
            c
        };

        cmd.current_dir(&params.project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(entries) = &params.injected_classpath {
            let joined = std::env::join_paths(entries)
                .context("joining injected classpath entries")?;
            cmd.env("CLASSPATH", joined);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning build command '{line}'"))?;

        let stdout = child.stdout.take().map(|out| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(out).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("build stdout: {}", line);
                }
            })
        });
        let stderr = child.stderr.take().map(|err| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(err).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("build stderr: {}", line);
                }
            })
        });

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for build command '{line}'"))?;

        for reader in [stdout, stderr].into_iter().flatten() {
            let _ = reader.await;
        }

        let code = status.code().unwrap_or(-1);
        info!(exit_code = code, success = status.success(), "build finished");

        if status.success() {
            Ok(())
        } else {
            Err(PlugwatchError::BuildFailure { code })
        }
    }
}

impl BuildTrigger for CommandBuildTrigger {
    fn run<'a>(&'a self, params: &'a BuildParameters) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.run_inner(params))
    }
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-_=./:,@+%".contains(c)
}

/// Quote `arg` for the platform shell unless it is made only of safe
/// characters.
pub fn shell_quote(arg: &str) -> String {
    if !arg.is_empty() && arg.chars().all(is_shell_safe) {
        return arg.to_string();
    }
    if cfg!(windows) {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
