// src/job/mod.rs

//! Job descriptors and results.
//!
//! - `model.rs`: raw (deserialized) and validated descriptor types, plus
//!   [`JobResult`].
//! - `validate.rs`: `RawJobDescriptor` → `JobDescriptor`.
//! - `loader.rs`: JSON parsing entry points.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, parse_and_validate, parse_raw};
pub use model::{
    image_slug, Dependency, DependencyService, JobDescriptor, JobResult, RawJobDescriptor,
    RawRunnerConfig, RunnerConfig, WaitSpec,
};
