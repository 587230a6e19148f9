// src/topology/synth.rs

//! `JobDescriptor` → [`Topology`].
//!
//! Synthesis is a pure function of the job and a [`TopologyTemplate`]; it
//! never touches the filesystem or the container runtime.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;

use crate::config::RunnerSettings;
use crate::job::{Dependency, JobDescriptor};
use crate::topology::model::{
    ServiceSpec, Topology, COMPOSE_VERSION, HOST_NETWORK, RUNNER_SERVICE, WAIT_KEY,
};

/// Worker-level inputs to synthesis that do not come from the job.
#[derive(Debug, Clone)]
pub struct TopologyTemplate {
    pub output_root: PathBuf,
    pub image_vendor: String,
    pub container_output_path: String,
    pub benchmark_command: String,
    pub env_prefix: String,
    pub wait_timeout_secs: u64,
}

impl TopologyTemplate {
    pub fn from_settings(settings: &RunnerSettings) -> Self {
        Self {
            output_root: settings.output_root.clone(),
            image_vendor: settings.image_vendor.clone(),
            container_output_path: settings.container_output_path.clone(),
            benchmark_command: settings.benchmark_command.clone(),
            env_prefix: settings.env_prefix.clone(),
            wait_timeout_secs: settings.wait_timeout_secs,
        }
    }
}

impl Default for TopologyTemplate {
    fn default() -> Self {
        Self::from_settings(&RunnerSettings::default())
    }
}

/// Service name of a dependency, namespaced by job id.
pub fn dependency_service_name(job_id: &str, dep: &Dependency) -> String {
    format!("job_{job_id}_{}", dep.slug())
}

/// Build the topology for `job`.
pub fn synthesize(job: &JobDescriptor, template: &TopologyTemplate) -> Topology {
    let mut services = BTreeMap::new();
    let mut dep_names = Vec::with_capacity(job.config.deps.len());

    for dep in &job.config.deps {
        let name = dependency_service_name(&job.id, dep);
        services.insert(name.clone(), dependency_service(&name, dep));
        dep_names.push(name);
    }

    services.insert(RUNNER_SERVICE.to_string(), runner_service(job, template, dep_names));

    let mut topology = Topology {
        version: COMPOSE_VERSION.to_string(),
        services,
    };
    topology.strip_key(WAIT_KEY);
    topology
}

fn dependency_service(service_name: &str, dep: &Dependency) -> ServiceSpec {
    let spec = dep.spec();
    let mut extra = spec.extra.clone();
    // Host networking is not negotiable.
    extra.remove("network_mode");

    ServiceSpec {
        network_mode: HOST_NETWORK.to_string(),
        image: spec.image.clone(),
        // Container names are daemon-global, so they get the job namespace too.
        container_name: spec.container_name.as_ref().map(|_| service_name.to_string()),
        extra,
        ..Default::default()
    }
}

fn runner_service(
    job: &JobDescriptor,
    template: &TopologyTemplate,
    depends_on: Vec<String>,
) -> ServiceSpec {
    let host_dir = template.output_root.join(&job.id);
    let volume = format!(
        "{}:{}:Z",
        host_dir.display(),
        template.container_output_path
    );

    ServiceSpec {
        network_mode: HOST_NETWORK.to_string(),
        image: Some(runner_image(job, template)),
        volumes: Some(vec![volume]),
        depends_on: Some(depends_on),
        environment: Some(runner_environment(job, template)),
        command: Some(format!(
            "{}{}",
            wait_for_chain(&job.config.deps, template.wait_timeout_secs),
            template.benchmark_command
        )),
        ..Default::default()
    }
}

/// `<vendor>/runner:<elixir>-<erlang>`
pub fn runner_image(job: &JobDescriptor, template: &TopologyTemplate) -> String {
    format!(
        "{}/runner:{}-{}",
        template.image_vendor, job.config.elixir_version, job.config.erlang_version
    )
}

fn runner_environment(job: &JobDescriptor, template: &TopologyTemplate) -> BTreeMap<String, Value> {
    let mut env = job.config.environment_variables.clone();
    let prefix = &template.env_prefix;
    env.insert(format!("{prefix}_REPO_SLUG"), Value::String(job.repo_slug.clone()));
    env.insert(format!("{prefix}_REPO_BRANCH"), Value::String(job.branch.clone()));
    env.insert(format!("{prefix}_REPO_COMMIT"), Value::String(job.commit.clone()));
    env
}

/// Startup gate prefix for the runner command.
///
/// One `wait-for.sh` call per dependency that declares a wait port, in
/// declaration order, so the first dependency's gate is the outermost.
pub fn wait_for_chain(deps: &[Dependency], timeout_secs: u64) -> String {
    deps.iter()
        .filter_map(Dependency::wait_port)
        .map(|port| format!("wait-for.sh localhost:{port} -t {timeout_secs} -- "))
        .collect()
}
