// src/exec/deadline.rs

//! Runs one topology under a hard wall-clock deadline.
//!
//! The backend future is spawned as its own task and raced against the
//! deadline. On expiry the task's cancellation token is fired and the caller
//! gets [`RunOutcome::TimedOut`] right away, together with a [`Straggler`]
//! for the task that is still terminating its processes.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::exec::backend::{ExecutorBackend, ToolOutput};
use crate::exec::compose::TERM_GRACE;
use crate::types::RunOutcome;

/// How long to wait for a cancelled run to wind down. The compose backend
/// has sent SIGKILL to the whole group by the end of `TERM_GRACE`.
pub const SETTLE_BOUND: Duration = Duration::from_secs(TERM_GRACE.as_secs() + 2);

/// A cancelled run whose task has not finished yet.
#[derive(Debug)]
pub struct Straggler {
    handle: JoinHandle<Result<ToolOutput>>,
}

impl Straggler {
    /// Wait up to `bound` for the task to finish, aborting it past that.
    /// Returns whether it finished on its own.
    pub async fn settle(mut self, bound: Duration) -> bool {
        match tokio::time::timeout(bound, &mut self.handle).await {
            Ok(_) => {
                debug!("cancelled run settled");
                true
            }
            Err(_) => {
                warn!(bound = ?bound, "cancelled run did not settle; aborting its task");
                self.handle.abort();
                false
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimeoutBoundedExecutor<E> {
    backend: E,
}

impl<E: ExecutorBackend> TimeoutBoundedExecutor<E> {
    pub fn new(backend: E) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &E {
        &self.backend
    }

    /// Bring up `topology_file` and wait at most `deadline` for it.
    ///
    /// Never fails: spawn errors and crashed tasks become
    /// [`RunOutcome::Crashed`]. A timed-out task is left to terminate in
    /// the background; use [`run_tracked`](Self::run_tracked) to wait for it.
    pub async fn run(&self, topology_file: &Path, deadline: Duration) -> RunOutcome {
        self.run_tracked(topology_file, deadline).await.0
    }

    /// Like [`run`](Self::run), but a timed-out run also hands back its
    /// still-running task.
    pub async fn run_tracked(
        &self,
        topology_file: &Path,
        deadline: Duration,
    ) -> (RunOutcome, Option<Straggler>) {
        let cancel = CancellationToken::new();
        let work = self
            .backend
            .run_topology(topology_file.to_path_buf(), cancel.clone());
        let mut handle = tokio::spawn(work);

        let outcome = match tokio::time::timeout(deadline, &mut handle).await {
            Ok(Ok(Ok(output))) => {
                info!(status = output.status, "run finished");
                RunOutcome::Exited {
                    status: output.status,
                    log: output.log,
                }
            }
            Ok(Ok(Err(err))) => {
                error!(error = %err, "run failed");
                RunOutcome::Crashed {
                    reason: format!("{err:#}"),
                }
            }
            Ok(Err(join_err)) => {
                error!(error = %join_err, "run task died");
                RunOutcome::Crashed {
                    reason: join_err.to_string(),
                }
            }
            Err(_) => {
                warn!(deadline = ?deadline, "deadline elapsed; cancelling run");
                cancel.cancel();
                return (RunOutcome::TimedOut, Some(Straggler { handle }));
            }
        };
        (outcome, None)
    }
}
