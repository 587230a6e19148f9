// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `benchrunner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "benchrunner",
    version,
    about = "Run one benchmark job in disposable containers and report its results.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the job descriptor (JSON).
    #[arg(long, value_name = "PATH")]
    pub job: PathBuf,

    /// Path to the runner settings file (TOML).
    ///
    /// Default: `Benchrunner.toml` in the current working directory; built-in
    /// defaults apply if that file does not exist.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the job deadline, e.g. `90s`, `15m`.
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BENCHRUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the job and print the synthesized topology without running it.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
