// src/lib.rs

pub mod cli;
pub mod collect;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod guard;
pub mod job;
pub mod logging;
pub mod reclaim;
pub mod topology;
pub mod types;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, load_or_default, parse_duration};
use crate::config::RunnerSettings;
use crate::engine::Orchestrator;
use crate::exec::ComposeBackend;
use crate::fs::{FileSystem, RealFileSystem};
use crate::reclaim::DockerReclaimer;
use crate::topology::{synthesize, TopologyTemplate};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings loading (+ `--timeout` override)
/// - job descriptor loading and validation
/// - the compose backend, the docker reclaimer and the orchestrator
///
/// The job result is printed to stdout as JSON. A non-zero tool status is
/// still a successful run of this function; only admission, setup and
/// reclaim failures are errors.
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = load_settings(&args)?;
    let job = job::load_and_validate(&args.job)
        .with_context(|| format!("loading job {}", args.job.display()))?;
    info!(job_id = %job.id, deps = job.config.deps.len(), "job loaded");

    if args.dry_run {
        let topology = synthesize(&job, &TopologyTemplate::from_settings(&settings));
        print!("{}", topology.to_yaml()?);
        debug!("dry-run complete (no execution)");
        return Ok(());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let orchestrator = Orchestrator::new(
        settings.clone(),
        ComposeBackend::from_settings(&settings),
        DockerReclaimer::from_settings(&settings, fs.clone()),
        fs,
    )?;

    let result = orchestrator.run_job(&job).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn load_settings(args: &CliArgs) -> Result<RunnerSettings> {
    let mut settings = match &args.config {
        Some(path) => load_and_validate(path)
            .with_context(|| format!("loading settings {}", path.display()))?,
        None => load_or_default(default_config_path())?,
    };

    if let Some(raw) = &args.timeout {
        let timeout = parse_duration(raw).map_err(|e| anyhow!("--timeout: {e}"))?;
        if timeout.is_zero() {
            return Err(anyhow!("--timeout must be greater than zero"));
        }
        settings.job_timeout = timeout;
    }

    debug!(?settings, "settings resolved");
    Ok(settings)
}
