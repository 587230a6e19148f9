// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawSettingsFile, RunnerSettings};
use crate::errors::Result;

/// Load a settings file from a given path and return the raw `RawSettingsFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettingsFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let settings: RawSettingsFile = toml::from_str(&contents)?;

    Ok(settings)
}

/// Load a settings file from path and validate it.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Parses the job timeout and checks the docker commands and paths.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<RunnerSettings> {
    let raw = load_from_path(&path)?;
    let settings = RunnerSettings::try_from(raw)?;
    Ok(settings)
}

/// Load settings, tolerating a missing file at the default location.
///
/// An explicitly requested path must exist; the default path may be absent,
/// in which case built-in defaults apply.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<RunnerSettings> {
    let path = path.as_ref();
    if path == default_config_path() && !path.exists() {
        debug!(path = %path.display(), "no settings file; using defaults");
        return RunnerSettings::try_from(RawSettingsFile::default());
    }
    load_and_validate(path)
}

/// `Benchrunner.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Benchrunner.toml")
}
