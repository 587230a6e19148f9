// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `ExecutorBackend` trait the orchestrator runs
//!   topologies through, so tests can swap in fakes.
//! - [`compose`] is the production backend: `docker-compose up` on the
//!   topology file, with its output captured as the job log.
//! - [`deadline`] wraps any backend with a wall-clock deadline and
//!   cancellation.

pub mod backend;
pub mod compose;
pub mod deadline;

pub use backend::{BoxFuture, ExecutorBackend, ToolOutput};
pub use compose::ComposeBackend;
pub use deadline::{Straggler, TimeoutBoundedExecutor, SETTLE_BOUND};
