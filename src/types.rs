// src/types.rs

//! Small shared types for the execution layer and the orchestrator.

/// Status reported when the job exceeded its deadline.
pub const TIMEOUT_STATUS: i32 = 127;

/// Log reported when the job exceeded its deadline.
pub const TIMEOUT_LOG: &str = "Job execution timed out";

/// Status reported when the orchestration tool produced no exit code
/// (spawn failure, crash of the supervising task, killed by a signal).
pub const NO_EXIT_STATUS: i32 = -1;

/// How a bounded run of the orchestration tool ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The tool exited on its own; `status` may be non-zero.
    Exited { status: i32, log: String },
    /// The tool could not be run, or its task died before reporting.
    Crashed { reason: String },
    /// The deadline elapsed first.
    TimedOut,
}

impl RunOutcome {
    pub fn status(&self) -> i32 {
        match self {
            RunOutcome::Exited { status, .. } => *status,
            RunOutcome::Crashed { .. } => NO_EXIT_STATUS,
            RunOutcome::TimedOut => TIMEOUT_STATUS,
        }
    }

    pub fn log(&self) -> &str {
        match self {
            RunOutcome::Exited { log, .. } => log,
            RunOutcome::Crashed { reason } => reason,
            RunOutcome::TimedOut => TIMEOUT_LOG,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, RunOutcome::TimedOut)
    }
}
