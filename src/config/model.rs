// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level runner settings as read from a TOML file.
///
/// ```toml
/// [runner]
/// output_root = "/tmp/benchmarks"
/// job_timeout = "15m"
/// image_vendor = "elixirbench"
///
/// [docker]
/// compose_command = ["docker-compose"]
/// docker_binary = "docker"
/// ```
///
/// Every section and key is optional. This is the unchecked form; use
/// [`RunnerSettings`] (obtained through `TryFrom`) everywhere else.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawSettingsFile {
    #[serde(default)]
    pub runner: RunnerSection,

    #[serde(default)]
    pub docker: DockerSection,
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerSection {
    /// Parent directory of every per-job output directory.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Wall-clock budget for one job, e.g. `"15m"` or `"900s"`.
    #[serde(default = "default_job_timeout")]
    pub job_timeout: String,

    /// Registry namespace of the runner image (`<vendor>/runner:<tag>`).
    #[serde(default = "default_image_vendor")]
    pub image_vendor: String,

    /// Where the job output directory is mounted inside the runner container.
    #[serde(default = "default_container_output_path")]
    pub container_output_path: String,

    /// Command the runner container executes once its dependencies are up.
    #[serde(default = "default_benchmark_command")]
    pub benchmark_command: String,

    /// Prefix for the injected `*_REPO_SLUG` / `*_REPO_BRANCH` / `*_REPO_COMMIT`.
    #[serde(default = "default_env_prefix")]
    pub env_prefix: String,

    /// `-t` argument passed to `wait-for.sh`.
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// Glob (matched against file names) selecting benchmark result files.
    #[serde(default = "default_result_pattern")]
    pub result_pattern: String,

    /// Lockfile written by the benchmarked project into the output directory.
    #[serde(default = "default_lockfile_name")]
    pub lockfile_name: String,
}

/// `[docker]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DockerSection {
    /// Program plus leading arguments, e.g. `["docker", "compose"]`.
    #[serde(default = "default_compose_command")]
    pub compose_command: Vec<String>,

    #[serde(default = "default_docker_binary")]
    pub docker_binary: String,
}

fn default_output_root() -> PathBuf {
    PathBuf::from("/tmp/benchmarks")
}

fn default_job_timeout() -> String {
    "15m".to_string()
}

fn default_image_vendor() -> String {
    "elixirbench".to_string()
}

fn default_container_output_path() -> String {
    "/var/bench".to_string()
}

fn default_benchmark_command() -> String {
    "mix run /runner/bench.exs".to_string()
}

fn default_env_prefix() -> String {
    "ELIXIRBENCH".to_string()
}

fn default_wait_timeout_secs() -> u64 {
    200
}

fn default_result_pattern() -> String {
    "*.json".to_string()
}

fn default_lockfile_name() -> String {
    "mix.lock".to_string()
}

fn default_compose_command() -> Vec<String> {
    vec!["docker-compose".to_string()]
}

fn default_docker_binary() -> String {
    "docker".to_string()
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            job_timeout: default_job_timeout(),
            image_vendor: default_image_vendor(),
            container_output_path: default_container_output_path(),
            benchmark_command: default_benchmark_command(),
            env_prefix: default_env_prefix(),
            wait_timeout_secs: default_wait_timeout_secs(),
            result_pattern: default_result_pattern(),
            lockfile_name: default_lockfile_name(),
        }
    }
}

impl Default for DockerSection {
    fn default() -> Self {
        Self {
            compose_command: default_compose_command(),
            docker_binary: default_docker_binary(),
        }
    }
}

/// Validated runner settings.
///
/// Only constructible through `TryFrom<RawSettingsFile>` (see
/// `config::validate`) or [`RunnerSettings::default`].
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub output_root: PathBuf,
    pub job_timeout: Duration,
    pub image_vendor: String,
    pub container_output_path: String,
    pub benchmark_command: String,
    pub env_prefix: String,
    pub wait_timeout_secs: u64,
    pub result_pattern: String,
    pub lockfile_name: String,
    pub compose_command: Vec<String>,
    pub docker_binary: String,
}

impl RunnerSettings {
    pub(crate) fn new_unchecked(
        runner: RunnerSection,
        docker: DockerSection,
        job_timeout: Duration,
    ) -> Self {
        Self {
            output_root: runner.output_root,
            job_timeout,
            image_vendor: runner.image_vendor,
            container_output_path: runner.container_output_path,
            benchmark_command: runner.benchmark_command,
            env_prefix: runner.env_prefix,
            wait_timeout_secs: runner.wait_timeout_secs,
            result_pattern: runner.result_pattern,
            lockfile_name: runner.lockfile_name,
            compose_command: docker.compose_command,
            docker_binary: docker.docker_binary,
        }
    }

    /// Output directory owned by the job with the given id.
    pub fn job_output_dir(&self, job_id: &str) -> PathBuf {
        self.output_root.join(job_id)
    }
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self::new_unchecked(
            RunnerSection::default(),
            DockerSection::default(),
            Duration::from_secs(15 * 60),
        )
    }
}
