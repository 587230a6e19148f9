#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde_json::Value;

use benchrunner::config::RunnerSettings;
use benchrunner::job::{
    DependencyService, JobDescriptor, RawJobDescriptor, RawRunnerConfig, WaitSpec,
};

/// Builder for `JobDescriptor` to simplify test setup.
///
/// Goes through `RawJobDescriptor` + `TryFrom`, so built jobs are validated
/// exactly like jobs read from disk.
pub struct JobBuilder {
    raw: RawJobDescriptor,
}

impl JobBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            raw: RawJobDescriptor {
                id: id.to_string(),
                repo_slug: "elixir-ecto/postgrex".to_string(),
                branch: "master".to_string(),
                commit: "ab12cd34".to_string(),
                config: RawRunnerConfig {
                    deps: vec![],
                    environment_variables: BTreeMap::new(),
                    elixir_version: "1.5.2".to_string(),
                    erlang_version: "20.1.2".to_string(),
                },
            },
        }
    }

    pub fn repo(mut self, slug: &str, branch: &str, commit: &str) -> Self {
        self.raw.repo_slug = slug.to_string();
        self.raw.branch = branch.to_string();
        self.raw.commit = commit.to_string();
        self
    }

    pub fn versions(mut self, elixir: &str, erlang: &str) -> Self {
        self.raw.config.elixir_version = elixir.to_string();
        self.raw.config.erlang_version = erlang.to_string();
        self
    }

    pub fn env(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.raw
            .config
            .environment_variables
            .insert(key.to_string(), value.into());
        self
    }

    pub fn dep(mut self, dep: DependencyService) -> Self {
        self.raw.config.deps.push(dep);
        self
    }

    pub fn raw(self) -> RawJobDescriptor {
        self.raw
    }

    pub fn build(self) -> JobDescriptor {
        JobDescriptor::try_from(self.raw).expect("Failed to build valid job from builder")
    }
}

/// Builder for `DependencyService`.
pub struct DependencyBuilder {
    dep: DependencyService,
}

impl DependencyBuilder {
    pub fn image(image: &str) -> Self {
        Self {
            dep: DependencyService {
                image: Some(image.to_string()),
                ..DependencyService::default()
            },
        }
    }

    pub fn named(container_name: &str) -> Self {
        Self {
            dep: DependencyService {
                container_name: Some(container_name.to_string()),
                ..DependencyService::default()
            },
        }
    }

    pub fn container_name(mut self, name: &str) -> Self {
        self.dep.container_name = Some(name.to_string());
        self
    }

    pub fn wait_port(mut self, port: u16) -> Self {
        self.dep.wait = Some(WaitSpec { port: Some(port) });
        self
    }

    /// Any other compose key, passed through verbatim.
    pub fn extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.dep.extra.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> DependencyService {
        self.dep
    }
}

/// Default settings rooted at `output_root`, with the given deadline.
pub fn settings_in(output_root: &Path, job_timeout: Duration) -> RunnerSettings {
    let mut settings = RunnerSettings::default();
    settings.output_root = output_root.to_path_buf();
    settings.job_timeout = job_timeout;
    settings
}
