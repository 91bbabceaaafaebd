//! Tracing subscriber initialization for the wsds binary.
//!
//! The terminal belongs to the UI, so log lines go to a file.
//!
//! # Filter priority (highest to lowest)
//!
//! 1. `WSDS_LOG` env var (per-target directives, e.g. `wsds=debug,warn`)
//! 2. `RUST_LOG` env var
//! 3. `logging.level` from the config file
//! 4. `warn`

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "warn";

/// Install the global subscriber, appending to `file`.
///
/// Fails if the file cannot be opened or a subscriber is already set.
pub fn init(level: &str, file: &Path) -> Result<()> {
    if let Some(parent) = file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .with_context(|| format!("Failed to open log file: {}", file.display()))?;

    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(build_env_filter(level))
        .with(fmt_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    tracing::debug!("logging to {}", file.display());
    Ok(())
}

fn build_env_filter(level: &str) -> EnvFilter {
    // Unparseable values fall through to the next source.
    if let Ok(directives) = std::env::var("WSDS_LOG") {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}
