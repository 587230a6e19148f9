// src/engine/mod.rs

//! Job orchestration engine.
//!
//! The [`Orchestrator`] owns the worker's single-flight guard and runs one
//! job at a time:
//!
//! 1. admit the job (or refuse with `ConcurrencyViolation`)
//! 2. synthesize the topology and write it into the job output directory
//! 3. run it under the deadline
//! 4. collect measurements and context unless the run timed out
//! 5. reclaim containers and the output directory, whatever happened above

pub mod orchestrator;

pub use orchestrator::{topology_file_name, Orchestrator};
