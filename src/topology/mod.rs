// src/topology/mod.rs

//! Container-topology synthesis.
//!
//! - [`model`] defines the emitted document ([`Topology`], [`ServiceSpec`]).
//! - [`synth`] turns a validated job into that document.

pub mod model;
pub mod synth;

pub use model::{
    strip_key, ServiceSpec, Topology, COMPOSE_VERSION, HOST_NETWORK, RUNNER_SERVICE, WAIT_KEY,
};
pub use synth::{
    dependency_service_name, runner_image, synthesize, wait_for_chain, TopologyTemplate,
};
