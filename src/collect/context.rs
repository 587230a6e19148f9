// src/collect/context.rs

//! Worker context attached to every finished job.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::collect::lockfile::{dependency_versions, DependencyVersions};
use crate::collect::system;
use crate::fs::FileSystem;

/// Worker facts plus the dependency versions the benchmarked project used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextRecord {
    pub dependency_versions: DependencyVersions,
    pub cpu_count: usize,
    pub worker_os: String,
    pub memory: String,
    pub cpu_speed: String,
}

#[derive(Debug, Clone)]
pub struct ContextCollector {
    lockfile_name: String,
}

impl ContextCollector {
    pub fn new(lockfile_name: impl Into<String>) -> Self {
        Self {
            lockfile_name: lockfile_name.into(),
        }
    }

    /// Build the context for the job that wrote `output_dir`.
    ///
    /// A missing or malformed lockfile yields an empty version map. Host
    /// facts are probed on every call.
    pub fn collect(&self, fs: &dyn FileSystem, output_dir: &Path) -> ContextRecord {
        ContextRecord {
            dependency_versions: self.read_versions(fs, output_dir),
            cpu_count: system::cpu_count(),
            worker_os: system::worker_os(),
            memory: system::memory(fs),
            cpu_speed: system::cpu_speed(fs),
        }
    }

    fn read_versions(&self, fs: &dyn FileSystem, output_dir: &Path) -> DependencyVersions {
        let path = output_dir.join(&self.lockfile_name);
        let parsed = fs
            .read_to_string(&path)
            .and_then(|contents| dependency_versions(&contents));

        match parsed {
            Ok(versions) => {
                debug!(lockfile = %path.display(), count = versions.len(), "read dependency versions");
                versions
            }
            Err(err) => {
                warn!(lockfile = %path.display(), error = %err, "no dependency versions");
                DependencyVersions::new()
            }
        }
    }
}

impl Default for ContextCollector {
    fn default() -> Self {
        Self::new("mix.lock")
    }
}
