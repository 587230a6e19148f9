// src/job/validate.rs

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{Result, RunnerError};
use crate::job::model::{
    Dependency, DependencyService, JobDescriptor, RawJobDescriptor, RunnerConfig,
};

/// Characters allowed in job ids and dependency names. Both end up in paths
/// and container service names.
static SAFE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("static regex is valid")
});

impl TryFrom<RawJobDescriptor> for JobDescriptor {
    type Error = RunnerError;

    fn try_from(raw: RawJobDescriptor) -> std::result::Result<Self, Self::Error> {
        validate_identity(&raw)?;
        validate_versions(&raw)?;
        let deps = resolve_dependencies(raw.config.deps)?;

        Ok(JobDescriptor {
            id: raw.id,
            repo_slug: raw.repo_slug,
            branch: raw.branch,
            commit: raw.commit,
            config: RunnerConfig {
                deps,
                environment_variables: raw.config.environment_variables,
                elixir_version: raw.config.elixir_version,
                erlang_version: raw.config.erlang_version,
            },
        })
    }
}

fn validate_identity(raw: &RawJobDescriptor) -> Result<()> {
    if !SAFE_NAME.is_match(&raw.id) {
        return Err(RunnerError::InvalidDescriptor(format!(
            "job id '{}' must match {}",
            raw.id,
            SAFE_NAME.as_str()
        )));
    }
    for (field, value) in [
        ("repo_slug", &raw.repo_slug),
        ("branch", &raw.branch),
        ("commit", &raw.commit),
    ] {
        if value.trim().is_empty() {
            return Err(RunnerError::InvalidDescriptor(format!(
                "job '{}': {field} must not be empty",
                raw.id
            )));
        }
    }
    Ok(())
}

fn validate_versions(raw: &RawJobDescriptor) -> Result<()> {
    for (field, value) in [
        ("elixir_version", &raw.config.elixir_version),
        ("erlang_version", &raw.config.erlang_version),
    ] {
        if value.trim().is_empty() || value.contains(char::is_whitespace) {
            return Err(RunnerError::InvalidDescriptor(format!(
                "job '{}': config.{field} '{}' is not a usable image tag component",
                raw.id, value
            )));
        }
    }
    Ok(())
}

/// Resolve every dependency's service-name slug, keeping declaration order.
fn resolve_dependencies(deps: Vec<DependencyService>) -> Result<Vec<Dependency>> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(deps.len());

    for (idx, spec) in deps.into_iter().enumerate() {
        let slug = match spec.name_hint() {
            Some(name) => name.to_string(),
            None => {
                return Err(RunnerError::InvalidDescriptor(format!(
                    "dependency #{idx} has neither `container_name` nor a valid `image`"
                )));
            }
        };

        if !SAFE_NAME.is_match(&slug) {
            return Err(RunnerError::InvalidDescriptor(format!(
                "dependency #{idx}: name '{slug}' must match {}",
                SAFE_NAME.as_str()
            )));
        }

        if !seen.insert(slug.clone()) {
            return Err(RunnerError::InvalidDescriptor(format!(
                "dependency #{idx}: duplicate dependency name '{slug}'"
            )));
        }

        resolved.push(Dependency::new_unchecked(slug, spec));
    }

    Ok(resolved)
}
