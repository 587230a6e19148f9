// src/topology/model.rs

//! The container-topology document handed to the orchestration tool.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::Result;

/// Name of the primary service that runs the benchmarks.
pub const RUNNER_SERVICE: &str = "runner";

/// Compose file format version written into every topology.
pub const COMPOSE_VERSION: &str = "3";

/// Every service shares the host network namespace so the runner can reach
/// dependency ports on `localhost`.
pub const HOST_NETWORK: &str = "host";

/// Runner-only directive; never valid in an emitted document.
pub const WAIT_KEY: &str = "wait";

/// A synthesized multi-service document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topology {
    pub version: String,
    pub services: BTreeMap<String, ServiceSpec>,
}

/// One service entry.
///
/// Fields the runner sets itself are typed; anything a dependency declared
/// beyond those lives in `extra` and is flattened into the same mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceSpec {
    pub network_mode: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<BTreeMap<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Topology {
    pub fn runner(&self) -> Option<&ServiceSpec> {
        self.services.get(RUNNER_SERVICE)
    }

    /// Remove `key` from every mapping in every service, at any depth.
    pub fn strip_key(&mut self, key: &str) {
        for spec in self.services.values_mut() {
            spec.strip_key(key);
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl ServiceSpec {
    pub fn strip_key(&mut self, key: &str) {
        strip_from_map(&mut self.extra, key);
        if let Some(env) = self.environment.as_mut() {
            env.remove(key);
            for value in env.values_mut() {
                strip_key(value, key);
            }
        }
    }
}

/// Recursively delete `key` from every object inside `value`.
pub fn strip_key(value: &mut Value, key: &str) {
    match value {
        Value::Object(map) => strip_from_map(map, key),
        Value::Array(items) => {
            for item in items {
                strip_key(item, key);
            }
        }
        _ => {}
    }
}

fn strip_from_map(map: &mut Map<String, Value>, key: &str) {
    map.remove(key);
    for value in map.values_mut() {
        strip_key(value, key);
    }
}
