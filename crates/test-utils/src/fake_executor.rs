use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use tokio_util::sync::CancellationToken;

use benchrunner::errors::RunnerError;
use benchrunner::exec::{BoxFuture, ExecutorBackend, ToolOutput};
use benchrunner::reclaim::{ReclaimFuture, Reclaimer};

/// What a [`FakeBackend`] does when asked to run a topology.
#[derive(Debug, Clone)]
pub enum FakeBehaviour {
    /// Write `artifacts` (name, contents) next to the topology file, then
    /// report `status` and `log`.
    Completes {
        status: i32,
        log: String,
        artifacts: Vec<(String, String)>,
    },
    /// Block until cancelled.
    Hangs,
    /// Fail as if the tool could not be spawned.
    Fails(String),
}

/// A fake executor that:
/// - records the topology files it was given, and their contents
/// - behaves according to its [`FakeBehaviour`], without any processes.
#[derive(Debug, Clone)]
pub struct FakeBackend {
    behaviour: FakeBehaviour,
    runs: Arc<Mutex<Vec<(PathBuf, String)>>>,
    cancelled: Arc<AtomicBool>,
}

impl FakeBackend {
    pub fn new(behaviour: FakeBehaviour) -> Self {
        Self {
            behaviour,
            runs: Arc::default(),
            cancelled: Arc::default(),
        }
    }

    pub fn exits(status: i32, log: &str) -> Self {
        Self::new(FakeBehaviour::Completes {
            status,
            log: log.to_string(),
            artifacts: vec![],
        })
    }

    pub fn with_artifact(mut self, name: &str, contents: &str) -> Self {
        if let FakeBehaviour::Completes { artifacts, .. } = &mut self.behaviour {
            artifacts.push((name.to_string(), contents.to_string()));
        }
        self
    }

    pub fn hangs() -> Self {
        Self::new(FakeBehaviour::Hangs)
    }

    pub fn fails(reason: &str) -> Self {
        Self::new(FakeBehaviour::Fails(reason.to_string()))
    }

    /// Topology files run so far, with the YAML they held at run time.
    pub fn runs(&self) -> Vec<(PathBuf, String)> {
        self.runs.lock().unwrap().clone()
    }

    /// Whether a hanging run observed its cancellation.
    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl ExecutorBackend for FakeBackend {
    fn run_topology(
        &self,
        topology_file: PathBuf,
        cancel: CancellationToken,
    ) -> BoxFuture<Result<ToolOutput>> {
        let yaml = std::fs::read_to_string(&topology_file).unwrap_or_default();
        self.runs.lock().unwrap().push((topology_file.clone(), yaml));

        let behaviour = self.behaviour.clone();
        let cancelled = self.cancelled.clone();

        Box::pin(async move {
            match behaviour {
                FakeBehaviour::Completes {
                    status,
                    log,
                    artifacts,
                } => {
                    let dir = topology_file
                        .parent()
                        .ok_or_else(|| anyhow!("topology file has no parent"))?;
                    for (name, contents) in artifacts {
                        std::fs::write(dir.join(name), contents)?;
                    }
                    Ok(ToolOutput { status, log })
                }
                FakeBehaviour::Hangs => {
                    cancel.cancelled().await;
                    cancelled.store(true, Ordering::SeqCst);
                    Err(anyhow!("cancelled"))
                }
                FakeBehaviour::Fails(reason) => Err(anyhow!(reason)),
            }
        })
    }
}

/// A fake reclaimer that records every directory it was asked to reclaim and
/// deletes it from the real filesystem. Optionally fails after deleting.
#[derive(Debug, Clone, Default)]
pub struct RecordingReclaimer {
    reclaimed: Arc<Mutex<Vec<PathBuf>>>,
    fail: bool,
}

impl RecordingReclaimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn reclaimed(&self) -> Vec<PathBuf> {
        self.reclaimed.lock().unwrap().clone()
    }
}

impl Reclaimer for RecordingReclaimer {
    fn reclaim<'a>(&'a self, output_dir: &'a Path) -> ReclaimFuture<'a> {
        Box::pin(async move {
            self.reclaimed.lock().unwrap().push(output_dir.to_path_buf());
            if output_dir.exists() {
                std::fs::remove_dir_all(output_dir)?;
            }
            if self.fail {
                return Err(RunnerError::ReclaimFailed(
                    "container runtime unreachable".to_string(),
                ));
            }
            Ok(())
        })
    }
}
