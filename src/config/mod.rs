// src/config/mod.rs

//! Runner settings.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a settings file from disk (`loader.rs`).
//! - Validate it into [`RunnerSettings`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{DockerSection, RawSettingsFile, RunnerSection, RunnerSettings};
pub use validate::parse_duration;
