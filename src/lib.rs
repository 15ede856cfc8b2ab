// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod container;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod orchestrator;
pub mod reload;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::build::CommandBuildTrigger;
use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::container::{container_id_file, DockerCli};
use crate::engine::{PipelineExecutor, PipelineSettings, ReloadPipeline, RuntimeEvent};
use crate::errors::Result;
use crate::fs::RealFileSystem;
use crate::orchestrator::Orchestrator;
use crate::reload::{HttpReloadTransport, ReloadSignaller};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the docker-backed container manager
/// - the build / artifact / reload pipeline
/// - the polling watcher (skipped in `--once` mode)
/// - the exit hook that tears the container down on Ctrl-C
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let fs = Arc::new(RealFileSystem);
    let (rt_tx, rt_rx) = mpsc::unbounded_channel::<RuntimeEvent>();

    let transport = HttpReloadTransport::new(cfg.reload.endpoint.clone(), cfg.reload.request_timeout)?;
    let signaller = ReloadSignaller::new(Arc::new(transport), cfg.reload.retry);
    let pipeline = ReloadPipeline::new(
        Arc::new(CommandBuildTrigger::new(cfg.build.cmd.clone())),
        fs.clone(),
        signaller,
        PipelineSettings::from_config(&cfg),
    );
    let executor = PipelineExecutor::new(pipeline, rt_tx.clone());

    let orchestrator = Orchestrator::new(cfg, fs, Arc::new(DockerCli::default()));
    orchestrator.run(executor, rt_tx, rt_rx, args.once).await
}

/// Print the resolved configuration without touching docker or the build.
fn print_dry_run(cfg: &ConfigFile) {
    println!("plugwatch dry-run");
    println!("  project_dir = {}", cfg.project_dir.display());
    println!("  queue_length = {}", cfg.queue_length);
    println!();

    println!("plugin:");
    println!("  name: {}", cfg.plugin.name);
    println!(
        "  artifact: {}/{}*.{}",
        cfg.plugin.build_output_dir.display(),
        cfg.plugin.name,
        cfg.plugin.artifact_extension
    );

    println!("watch:");
    for root in &cfg.watch.roots {
        println!("  - {}", root.display());
    }
    if !cfg.watch.exclude.is_empty() {
        println!("  exclude: {:?}", cfg.watch.exclude);
    }
    println!(
        "  poll_interval: {:?}, quiet_period: {:?}",
        cfg.watch.poll_interval, cfg.watch.quiet_period
    );

    let trigger = CommandBuildTrigger::new(cfg.build.cmd.clone());
    println!("build:");
    println!("  cmd: {}", trigger.command_line(&cfg.build.args));
    if let Some(ref classpath) = cfg.build.classpath {
        println!("  classpath: {:?}", classpath);
    }

    let spec = &cfg.container.spec;
    println!("container:");
    println!("  image: {}", spec.image);
    if let Some(ref name) = spec.name {
        println!("  name: {name}");
    }
    for port in &spec.ports {
        println!("  port: {port}");
    }
    println!(
        "  id_file: {}",
        container_id_file(&cfg.container.id_dir, &cfg.container.task_path).display()
    );

    println!("reload:");
    println!("  url: {}{}", cfg.reload.host, cfg.reload.endpoint.replace("{name}", &cfg.plugin.name));
    println!("  user: {}", cfg.reload.credentials.username);
    println!(
        "  retry: {} attempt(s), {:?} apart",
        cfg.reload.retry.max_attempts, cfg.reload.retry.backoff
    );

    debug!("dry-run complete (nothing started)");
}
