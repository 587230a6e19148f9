// src/config/validate.rs

use std::path::Path;
use std::time::Duration;

use globset::Glob;

use crate::config::model::{RawSettingsFile, RunnerSettings};
use crate::errors::{Result, RunnerError};

impl TryFrom<RawSettingsFile> for RunnerSettings {
    type Error = RunnerError;

    fn try_from(raw: RawSettingsFile) -> std::result::Result<Self, Self::Error> {
        let job_timeout = validate_raw_settings(&raw)?;
        Ok(RunnerSettings::new_unchecked(raw.runner, raw.docker, job_timeout))
    }
}

fn validate_raw_settings(raw: &RawSettingsFile) -> Result<Duration> {
    let job_timeout = validate_timeout(&raw.runner.job_timeout)?;
    validate_strings(raw)?;
    validate_paths(raw)?;
    validate_docker(raw)?;
    Ok(job_timeout)
}

fn validate_timeout(s: &str) -> Result<Duration> {
    let timeout = parse_duration(s).map_err(|e| {
        RunnerError::ConfigError(format!("[runner].job_timeout: {e}"))
    })?;
    if timeout.is_zero() {
        return Err(RunnerError::ConfigError(
            "[runner].job_timeout must be greater than zero".to_string(),
        ));
    }
    Ok(timeout)
}

fn validate_strings(raw: &RawSettingsFile) -> Result<()> {
    let runner = &raw.runner;
    let required = [
        ("image_vendor", &runner.image_vendor),
        ("benchmark_command", &runner.benchmark_command),
        ("env_prefix", &runner.env_prefix),
        ("lockfile_name", &runner.lockfile_name),
    ];
    for (key, value) in required {
        if value.trim().is_empty() {
            return Err(RunnerError::ConfigError(format!(
                "[runner].{key} must not be empty"
            )));
        }
    }

    Glob::new(&runner.result_pattern).map_err(|e| {
        RunnerError::ConfigError(format!(
            "[runner].result_pattern '{}' is not a valid glob: {e}",
            runner.result_pattern
        ))
    })?;

    Ok(())
}

fn validate_paths(raw: &RawSettingsFile) -> Result<()> {
    // Compose reads a relative host path as a named volume, not a bind mount.
    if !raw.runner.output_root.is_absolute() {
        return Err(RunnerError::ConfigError(format!(
            "[runner].output_root must be absolute (got '{}')",
            raw.runner.output_root.display()
        )));
    }
    if !Path::new(&raw.runner.container_output_path).is_absolute() {
        return Err(RunnerError::ConfigError(format!(
            "[runner].container_output_path must be absolute (got '{}')",
            raw.runner.container_output_path
        )));
    }
    Ok(())
}

fn validate_docker(raw: &RawSettingsFile) -> Result<()> {
    match raw.docker.compose_command.first() {
        Some(program) if !program.trim().is_empty() => {}
        _ => {
            return Err(RunnerError::ConfigError(
                "[docker].compose_command must name a program".to_string(),
            ));
        }
    }
    if raw.docker.docker_binary.trim().is_empty() {
        return Err(RunnerError::ConfigError(
            "[docker].docker_binary must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Parse durations such as `"500ms"`, `"30s"`, `"15m"` or `"1h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ))
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_units() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration(" 2h ").unwrap(), Duration::from_secs(7200));
    }

    #[test]
    fn rejects_bad_durations() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10d").is_err());
        assert!(parse_duration("m").is_err());
    }

    #[test]
    fn overflowing_durations_are_errors() {
        let err = parse_duration("5124095576030432h").unwrap_err();
        assert!(err.contains("too large"));
        assert!(parse_duration("307445734561825861m").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s").unwrap(),
            Duration::from_secs(u64::MAX)
        );
    }

    #[test]
    fn defaults_are_valid() {
        let settings = RunnerSettings::try_from(RawSettingsFile::default()).unwrap();
        assert_eq!(settings.job_timeout, Duration::from_secs(900));
        assert_eq!(settings.wait_timeout_secs, 200);
        assert_eq!(settings.compose_command, vec!["docker-compose".to_string()]);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut raw = RawSettingsFile::default();
        raw.runner.job_timeout = "0s".to_string();
        let err = RunnerSettings::try_from(raw).unwrap_err();
        assert!(matches!(err, RunnerError::ConfigError(msg) if msg.contains("greater than zero")));
    }

    #[test]
    fn empty_compose_command_is_rejected() {
        let mut raw = RawSettingsFile::default();
        raw.docker.compose_command.clear();
        assert!(matches!(
            RunnerSettings::try_from(raw),
            Err(RunnerError::ConfigError(_))
        ));
    }

    #[test]
    fn relative_output_root_is_rejected() {
        let mut raw = RawSettingsFile::default();
        raw.runner.output_root = "tmp/out".into();
        assert!(matches!(
            RunnerSettings::try_from(raw),
            Err(RunnerError::ConfigError(msg)) if msg.contains("output_root must be absolute")
        ));
    }

    #[test]
    fn relative_container_path_is_rejected() {
        let mut raw = RawSettingsFile::default();
        raw.runner.container_output_path = "bench".to_string();
        assert!(matches!(
            RunnerSettings::try_from(raw),
            Err(RunnerError::ConfigError(msg)) if msg.contains("absolute")
        ));
    }
}
