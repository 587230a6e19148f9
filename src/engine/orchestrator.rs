// src/engine/orchestrator.rs

//! One job, start to finish.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument};

use crate::collect::{ContextCollector, ContextRecord, MeasurementCollector, Measurements};
use crate::config::RunnerSettings;
use crate::errors::{Result, RunnerError};
use crate::exec::{ExecutorBackend, Straggler, TimeoutBoundedExecutor, SETTLE_BOUND};
use crate::fs::FileSystem;
use crate::guard::SingleFlightGuard;
use crate::job::{JobDescriptor, JobResult};
use crate::reclaim::Reclaimer;
use crate::topology::{synthesize, TopologyTemplate};
use crate::types::{RunOutcome, TIMEOUT_LOG};

/// File name of the topology written into the job output directory.
pub fn topology_file_name(job_id: &str) -> String {
    format!("{job_id}-config.yml")
}

/// Drives a job through admission, topology synthesis, the bounded run,
/// collection and teardown.
pub struct Orchestrator<E, R> {
    settings: RunnerSettings,
    template: TopologyTemplate,
    guard: SingleFlightGuard,
    executor: TimeoutBoundedExecutor<E>,
    reclaimer: R,
    fs: Arc<dyn FileSystem>,
    measurements: MeasurementCollector,
    context: ContextCollector,
}

impl<E, R> Orchestrator<E, R>
where
    E: ExecutorBackend,
    R: Reclaimer,
{
    pub fn new(
        settings: RunnerSettings,
        backend: E,
        reclaimer: R,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let measurements = MeasurementCollector::new(&settings.result_pattern)
            .map_err(|e| RunnerError::ConfigError(format!("{e:#}")))?;
        let context = ContextCollector::new(settings.lockfile_name.clone());

        Ok(Self {
            template: TopologyTemplate::from_settings(&settings),
            settings,
            guard: SingleFlightGuard::new(),
            executor: TimeoutBoundedExecutor::new(backend),
            reclaimer,
            fs,
            measurements,
            context,
        })
    }

    pub fn guard(&self) -> &SingleFlightGuard {
        &self.guard
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    pub fn backend(&self) -> &E {
        self.executor.backend()
    }

    /// Run `job` under the configured deadline.
    pub async fn run_job(&self, job: &JobDescriptor) -> Result<JobResult> {
        self.run_job_with_deadline(job, self.settings.job_timeout)
            .await
    }

    /// Run `job` under an explicit deadline.
    ///
    /// Returns `Err(ConcurrencyViolation)` without side effects if another
    /// job holds the worker. Once admitted, the output directory is always
    /// reclaimed; a reclaim failure is returned in place of the job result
    /// and leaves the worker refusing further jobs. After a timeout the
    /// guard stays held until the tool's processes are gone.
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    pub async fn run_job_with_deadline(
        &self,
        job: &JobDescriptor,
        deadline: Duration,
    ) -> Result<JobResult> {
        let token = self.guard.acquire()?;
        info!(repo = %job.repo_slug, commit = %job.commit, "job admitted");

        let output_dir = self.settings.job_output_dir(&job.id);
        let (attempt, straggler) = self.attempt(job, &output_dir, deadline).await;
        if let Some(straggler) = straggler {
            straggler.settle(SETTLE_BOUND).await;
        }

        if let Err(err) = self.reclaimer.reclaim(&output_dir).await {
            error!(error = %err, "reclaim failed; refusing further jobs");
            self.guard.poison(token);
            return Err(err);
        }
        self.guard.release(token);

        let result = attempt?;
        info!(status = result.status, "job finished");
        Ok(result)
    }

    async fn attempt(
        &self,
        job: &JobDescriptor,
        output_dir: &Path,
        deadline: Duration,
    ) -> (Result<JobResult>, Option<Straggler>) {
        let topology_file = match self.write_topology(job, output_dir) {
            Ok(path) => path,
            Err(err) => return (Err(err), None),
        };
        let (outcome, straggler) = self.executor.run_tracked(&topology_file, deadline).await;

        let (measurements, context) = if outcome.timed_out() {
            (Measurements::new(), None)
        } else {
            (
                self.measurements.collect(self.fs.as_ref(), output_dir),
                Some(self.context.collect(self.fs.as_ref(), output_dir)),
            )
        };

        (Ok(result_for(job, outcome, measurements, context)), straggler)
    }

    fn write_topology(&self, job: &JobDescriptor, output_dir: &Path) -> Result<PathBuf> {
        let topology = synthesize(job, &self.template);
        let yaml = topology.to_yaml()?;

        self.fs.create_dir_all(output_dir)?;
        let path = output_dir.join(topology_file_name(&job.id));
        self.fs.write(&path, yaml.as_bytes())?;

        debug!(path = %path.display(), services = topology.services.len(), "topology written");
        Ok(path)
    }
}

fn result_for(
    job: &JobDescriptor,
    outcome: RunOutcome,
    measurements: Measurements,
    context: Option<ContextRecord>,
) -> JobResult {
    let status = outcome.status();
    let log = match outcome {
        RunOutcome::Exited { log, .. } => log,
        RunOutcome::Crashed { reason } => reason,
        RunOutcome::TimedOut => TIMEOUT_LOG.to_string(),
    };

    JobResult {
        job_id: job.id.clone(),
        status,
        log,
        measurements,
        context,
    }
}
