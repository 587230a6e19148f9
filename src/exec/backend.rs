// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The orchestrator talks to an `ExecutorBackend` instead of spawning
//! processes itself. Production uses [`ComposeBackend`](super::ComposeBackend);
//! tests provide backends that finish instantly, hang until cancelled, or
//! fail, without a container runtime.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

/// Boxed future that can be moved onto its own Tokio task.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// What the orchestration tool reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub status: i32,
    /// stdout and stderr, interleaved line by line.
    pub log: String,
}

/// Trait abstracting how a topology file is brought up.
pub trait ExecutorBackend: Send + Sync {
    /// Run the topology in `topology_file` to completion.
    ///
    /// The returned future must own everything it needs: it is spawned as a
    /// detached task. When `cancel` fires, the implementation must stop any
    /// processes it started before resolving.
    fn run_topology(
        &self,
        topology_file: PathBuf,
        cancel: CancellationToken,
    ) -> BoxFuture<Result<ToolOutput>>;
}
