// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_project_path;

/// Command-line arguments for `wbsched`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "wbsched",
    version,
    about = "Load a WBS project file, roll up budgets and schedule its relations.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the project seed file (TOML).
    ///
    /// Default: `Project.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_project_path())]
    pub project: PathBuf,

    /// Directory to save the recomputed project into, one TOML file per
    /// project.
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WBSCHED_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the WBS tree, but don't recompute anything.
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
