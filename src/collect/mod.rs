// src/collect/mod.rs

//! Post-run harvesting of the job output directory.
//!
//! - [`measurements`]: benchmark result files → `"<benchmark>/<metric>"` map.
//! - [`context`]: worker facts + dependency versions.
//! - [`lockfile`]: the `mix.lock` literal parser used by [`context`].
//! - [`system`]: host probes used by [`context`].
//!
//! Collectors never fail: broken artifacts contribute nothing.

pub mod context;
pub mod lockfile;
pub mod measurements;
pub mod system;

pub use context::{ContextCollector, ContextRecord};
pub use lockfile::DependencyVersions;
pub use measurements::{format_measurement, MeasurementCollector, Measurements};
