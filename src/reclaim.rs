// src/reclaim.rs

//! Post-job teardown of containers, images, volumes and the job output
//! directory.
//!
//! Every job, however it ended, is followed by exactly one reclaim. A
//! failed reclaim is fatal for the worker: the orchestrator poisons its
//! single-flight guard so no further job is admitted onto a dirty host.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::RunnerSettings;
use crate::errors::{Result, RunnerError};
use crate::fs::FileSystem;

/// Boxed future borrowing the reclaimer and the directory for its lifetime.
pub type ReclaimFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Seam for teardown so the orchestrator can be tested without Docker.
pub trait Reclaimer: Send + Sync {
    /// Stop all containers, prune all container-runtime state and delete
    /// `output_dir`. Errors are reported as [`RunnerError::ReclaimFailed`].
    fn reclaim<'a>(&'a self, output_dir: &'a Path) -> ReclaimFuture<'a>;
}

/// Reclaims through the `docker` CLI.
#[derive(Debug, Clone)]
pub struct DockerReclaimer {
    docker_binary: String,
    fs: Arc<dyn FileSystem>,
}

impl DockerReclaimer {
    pub fn new(docker_binary: impl Into<String>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            docker_binary: docker_binary.into(),
            fs,
        }
    }

    pub fn from_settings(settings: &RunnerSettings, fs: Arc<dyn FileSystem>) -> Self {
        Self::new(settings.docker_binary.clone(), fs)
    }

    async fn teardown_containers(&self) -> Result<()> {
        let listing = self.docker(&["ps", "-q"]).await?;
        let ids: Vec<&str> = listing.split_whitespace().collect();

        if ids.is_empty() {
            debug!("no running containers");
        } else {
            info!(count = ids.len(), "stopping running containers");
            let mut args = vec!["stop"];
            args.extend(ids);
            self.docker(&args).await?;
        }

        self.docker(&["system", "prune", "--all", "--force", "--volumes"])
            .await?;
        Ok(())
    }

    /// Run `docker <args>` and return its stdout. Non-zero exit is an error.
    async fn docker(&self, args: &[&str]) -> Result<String> {
        debug!(docker = %self.docker_binary, ?args, "running");
        let output = Command::new(&self.docker_binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                RunnerError::ReclaimFailed(format!(
                    "spawning '{} {}': {e}",
                    self.docker_binary,
                    args.join(" ")
                ))
            })?;

        if !output.status.success() {
            return Err(RunnerError::ReclaimFailed(format!(
                "'{} {}' exited with {}: {}",
                self.docker_binary,
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Reclaimer for DockerReclaimer {
    fn reclaim<'a>(&'a self, output_dir: &'a Path) -> ReclaimFuture<'a> {
        Box::pin(async move {
            let containers = self.teardown_containers().await;
            if let Err(err) = &containers {
                warn!(error = %err, "container teardown failed");
            }

            // Always attempt the directory, even after a runtime failure.
            let directory = self.fs.remove_dir_all(output_dir).map_err(|e| {
                RunnerError::ReclaimFailed(format!(
                    "removing {}: {e:#}",
                    output_dir.display()
                ))
            });

            containers?;
            directory?;
            info!(output_dir = %output_dir.display(), "resources reclaimed");
            Ok(())
        })
    }
}
