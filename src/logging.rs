// src/logging.rs

//! Diagnostics for the `wbsched` binary.
//!
//! Stdout carries only the recompute report (or the dry-run tree). Progress
//! lines go to stderr: tasks and relations as they are seeded, rollup and
//! scheduling passes at `debug`, and every schedule slip at `warn`.
//!
//! The filter is picked in this order:
//! 1. `--log-level`, applied to this crate's targets only,
//! 2. `WBSCHED_LOG`, read as a full `EnvFilter` directive string
//!    (e.g. `"wbsched::dag=debug,wbsched::store=trace"`),
//! 3. `wbsched=info`.
//!
//! Other crates are held at `warn` unless `WBSCHED_LOG` says otherwise.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "WBSCHED_LOG";

const DEFAULT_DIRECTIVES: &str = "warn,wbsched=info";

/// Install the global subscriber. Call once, before the project file is read.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let directives = filter_directives(cli_level, env_value.as_deref());
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter '{directives}'"))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    let env_rejected = cli_level.is_none()
        && env_value
            .as_deref()
            .map(str::trim)
            .is_some_and(|v| !v.is_empty() && EnvFilter::try_new(v).is_err());
    if env_rejected {
        tracing::warn!(var = LOG_ENV_VAR, "ignoring unparseable log filter");
    }
    Ok(())
}

/// Directive string for the given flag and `WBSCHED_LOG` value.
fn filter_directives(cli_level: Option<LogLevel>, env_value: Option<&str>) -> String {
    if let Some(level) = cli_level {
        return format!("warn,wbsched={}", level_name(level));
    }
    match env_value.map(str::trim) {
        Some(value) if !value.is_empty() && EnvFilter::try_new(value).is_ok() => value.to_string(),
        _ => DEFAULT_DIRECTIVES.to_string(),
    }
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
