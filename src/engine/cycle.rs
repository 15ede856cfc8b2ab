// src/engine/cycle.rs

//! One reload cycle: build, locate the artifact, reload it.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, Instrument};

use crate::build::{find_artifact, BuildParameters, BuildTrigger};
use crate::config::ConfigFile;
use crate::engine::{CycleId, CycleOutcome, CycleReason, RuntimeEvent};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::reload::{Credentials, ReloadSignaller};
use crate::types::BoxFuture;
use crate::watch::ChangeSet;

/// A cycle the core decided to start.
#[derive(Debug, Clone)]
pub struct CycleJob {
    pub cycle_id: CycleId,
    pub changes: ChangeSet,
    pub reason: CycleReason,
}

/// How the runtime hands cycles off.
///
/// `start_cycle` must return promptly; the executor reports the result later
/// with a `CycleFinished` event. Tests plug in a fake that completes cycles
/// on demand.
pub trait CycleExecutor: Send {
    fn start_cycle(&mut self, job: CycleJob) -> BoxFuture<'_, Result<()>>;
}

/// Static inputs of every cycle, resolved from the config once.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub plugin_name: String,
    pub build: BuildParameters,
    pub output_dir: PathBuf,
    pub artifact_extension: String,
    pub host: String,
    pub credentials: Credentials,
}

impl PipelineSettings {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            plugin_name: cfg.plugin.name.clone(),
            build: BuildParameters {
                project_dir: cfg.project_dir.clone(),
                injected_classpath: cfg.build.classpath.clone(),
                build_args: cfg.build.args.clone(),
            },
            output_dir: cfg.plugin.build_output_dir.clone(),
            artifact_extension: cfg.plugin.artifact_extension.clone(),
            host: cfg.reload.host.clone(),
            credentials: cfg.reload.credentials.clone(),
        }
    }
}

/// Sequential build → artifact lookup → reload, stopping at the first error.
#[derive(Clone)]
pub struct ReloadPipeline {
    build: Arc<dyn BuildTrigger>,
    fs: Arc<dyn FileSystem>,
    signaller: ReloadSignaller,
    settings: Arc<PipelineSettings>,
}

impl std::fmt::Debug for ReloadPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadPipeline")
            .field("settings", &self.settings)
            .field("signaller", &self.signaller)
            .finish_non_exhaustive()
    }
}

impl ReloadPipeline {
    pub fn new(
        build: Arc<dyn BuildTrigger>,
        fs: Arc<dyn FileSystem>,
        signaller: ReloadSignaller,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            build,
            fs,
            signaller,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run one cycle and return the artifact that was reloaded.
    pub async fn run_cycle(&self) -> Result<PathBuf> {
        let s = &self.settings;

        self.build.run(&s.build).await?;

        let artifact = find_artifact(
            self.fs.as_ref(),
            &s.output_dir,
            &s.plugin_name,
            &s.artifact_extension,
        )?;
        info!(artifact = ?artifact, "located build artifact");

        self.signaller
            .reload_plugin(&s.plugin_name, artifact.clone(), &s.host, &s.credentials)
            .await?;

        Ok(artifact)
    }
}

/// Production executor: runs each cycle on its own task and reports back
/// over the runtime channel.
#[derive(Debug)]
pub struct PipelineExecutor {
    pipeline: ReloadPipeline,
    runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
}

impl PipelineExecutor {
    pub fn new(pipeline: ReloadPipeline, runtime_tx: mpsc::UnboundedSender<RuntimeEvent>) -> Self {
        Self {
            pipeline,
            runtime_tx,
        }
    }
}

impl CycleExecutor for PipelineExecutor {
    fn start_cycle(&mut self, job: CycleJob) -> BoxFuture<'_, Result<()>> {
        let pipeline = self.pipeline.clone();
        let tx = self.runtime_tx.clone();
        let span = tracing::info_span!("cycle", id = job.cycle_id);

        tokio::spawn(
            async move {
                let outcome = match pipeline.run_cycle().await {
                    Ok(_) => CycleOutcome::Succeeded,
                    Err(err) => {
                        error!(error = %err, "reload cycle error");
                        CycleOutcome::Failed(err.to_string())
                    }
                };
                let _ = tx.send(RuntimeEvent::CycleFinished {
                    cycle_id: job.cycle_id,
                    outcome,
                });
            }
            .instrument(span),
        );

        Box::pin(async { Ok(()) })
    }
}
