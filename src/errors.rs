// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::guard::ConcurrencyViolation;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid job descriptor: {0}")]
    InvalidDescriptor(String),

    #[error(transparent)]
    ConcurrencyViolation(#[from] ConcurrencyViolation),

    /// Teardown of containers or the job output directory failed.
    ///
    /// This is fatal: the worker must not accept another job afterwards.
    #[error("Resource reclamation failed: {0}")]
    ReclaimFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RunnerError {
    /// Whether this error leaves the worker unable to run further jobs.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RunnerError::ReclaimFailed(_))
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunnerError>;
