// src/job/model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::collect::{ContextRecord, Measurements};

/// A job descriptor exactly as handed over by the job source (JSON).
///
/// ```json
/// {
///   "id": "42",
///   "repo_slug": "elixir-ecto/postgrex",
///   "branch": "master",
///   "commit": "ab12cd",
///   "config": {
///     "elixir_version": "1.5.2",
///     "erlang_version": "20.1.2",
///     "environment_variables": { "PG_URL": "postgres:postgres@localhost" },
///     "deps": [
///       { "image": "postgres:9.6", "wait": { "port": 5432 } }
///     ]
///   }
/// }
/// ```
///
/// Use [`JobDescriptor`] (obtained through `TryFrom`) for anything beyond
/// deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawJobDescriptor {
    pub id: String,
    pub repo_slug: String,
    pub branch: String,
    pub commit: String,
    pub config: RawRunnerConfig,
}

/// `config` object of a raw descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRunnerConfig {
    /// Dependency services, in the order they must start.
    #[serde(default)]
    pub deps: Vec<DependencyService>,

    #[serde(default)]
    pub environment_variables: BTreeMap<String, Value>,

    pub elixir_version: String,

    pub erlang_version: String,
}

/// One dependency container as declared by the job.
///
/// `container_name`, `image` and `wait` are interpreted by the runner; every
/// other key lands in `extra` and is passed through to the topology as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyService {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<WaitSpec>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Startup gate for a dependency: the runner waits until `localhost:<port>`
/// accepts connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitSpec {
    #[serde(default)]
    pub port: Option<u16>,
}

impl DependencyService {
    /// Name this dependency contributes to its service name: the container
    /// name if set, otherwise the image slug.
    pub fn name_hint(&self) -> Option<&str> {
        match self.container_name.as_deref() {
            Some(name) => Some(name),
            None => self.image.as_deref().and_then(image_slug),
        }
    }

    pub fn wait_port(&self) -> Option<u16> {
        self.wait.and_then(|w| w.port)
    }
}

/// Repository part of an image reference: after the last `/`, before any
/// `:tag` or `@digest`.
///
/// `"mysql:5.7.20"` → `"mysql"`, `"quay.io/coreos/etcd:v3"` → `"etcd"`.
pub fn image_slug(image: &str) -> Option<&str> {
    let last = image.rsplit('/').next()?;
    let end = last.find([':', '@']).unwrap_or(last.len());
    let slug = &last[..end];
    if slug.is_empty() { None } else { Some(slug) }
}

/// A dependency whose service-name slug has been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    slug: String,
    spec: DependencyService,
}

impl Dependency {
    pub(crate) fn new_unchecked(slug: String, spec: DependencyService) -> Self {
        Self { slug, spec }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn spec(&self) -> &DependencyService {
        &self.spec
    }

    pub fn wait_port(&self) -> Option<u16> {
        self.spec.wait_port()
    }
}

/// Validated runner configuration of a job.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    pub deps: Vec<Dependency>,
    pub environment_variables: BTreeMap<String, Value>,
    pub elixir_version: String,
    pub erlang_version: String,
}

/// A validated job.
///
/// Only constructible through `TryFrom<RawJobDescriptor>` (see
/// `job::validate`), so every dependency is known to have a usable name.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDescriptor {
    pub id: String,
    pub repo_slug: String,
    pub branch: String,
    pub commit: String,
    pub config: RunnerConfig,
}

/// Outcome of one job attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
    pub job_id: String,
    /// Exit code of the orchestration tool, `127` on timeout, `-1` if the
    /// tool could not be run at all.
    pub status: i32,
    pub log: String,
    pub measurements: Measurements,
    /// Absent when the job timed out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextRecord>,
}

impl JobResult {
    pub fn succeeded(&self) -> bool {
        self.status == 0
    }
}
