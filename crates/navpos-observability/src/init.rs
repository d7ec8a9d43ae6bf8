// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization for navpos
//!
//! Console output is always available. With the `file-logging` feature, each
//! run also gets a timestamped folder of JSON log files:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       ├── navpos_session.log
//!       ├── navpos_decoding.log
//!       └── navpos.log (combined)
//! ```

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingConfig};

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Initialize console logging
///
/// Crates named in `debug_flags` log at debug level, everything else at
/// `config.level`. `RUST_LOG` is not consulted.
pub fn init_console_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(debug_flags.to_filter_string(&config.level))
        .with_context(|| format!("Invalid log level: {}", config.level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

/// Folder name for a run started at `now`
pub fn run_folder_name(now: DateTime<Utc>) -> String {
    format!("{}{}", RUN_PREFIX, now.format(RUN_TIMESTAMP_FORMAT))
}

fn parse_run_folder_name(dir_name: &str) -> Option<DateTime<Utc>> {
    let timestamp_str = dir_name.strip_prefix(RUN_PREFIX)?;
    NaiveDateTime::parse_from_str(timestamp_str, RUN_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Clean up old run folders based on retention policy
///
/// Folders older than `retention_days` are removed first, then the oldest
/// remaining folders until at most `retention_runs` are left. Returns the
/// number of folders removed.
pub fn cleanup_old_logs(
    base_log_dir: &Path,
    retention_days: u64,
    retention_runs: usize,
    now: DateTime<Utc>,
) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }

    let cutoff_date = now - chrono::Duration::days(retention_days as i64);

    let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let parsed = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_run_folder_name);
        if let Some(dt) = parsed {
            runs.push((path, dt));
        }
    }

    // Oldest first
    runs.sort_by_key(|(_, dt)| *dt);

    let expired = runs.iter().take_while(|(_, dt)| *dt < cutoff_date).count();
    let over_budget = runs.len().saturating_sub(expired).saturating_sub(retention_runs);
    let to_remove = expired + over_budget;

    let mut removed_count = 0;
    for (path, _) in runs.iter().take(to_remove) {
        if let Err(e) = std::fs::remove_dir_all(path) {
            tracing::warn!("Failed to remove old log directory {}: {}", path.display(), e);
        } else {
            removed_count += 1;
        }
    }

    Ok(removed_count)
}

/// Apply the retention policy, then create the folder for the run starting at `now`
///
/// Room is made for the new run before it exists, so cleanup never removes it.
pub fn prepare_run_folder(
    base_log_dir: &Path,
    retention_days: u64,
    retention_runs: usize,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    cleanup_old_logs(base_log_dir, retention_days, retention_runs.saturating_sub(1), now)?;

    let run_folder = base_log_dir.join(run_folder_name(now));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;
    Ok(run_folder)
}

#[cfg(feature = "file-logging")]
pub use file::{init_logging, LoggingGuard};

#[cfg(feature = "file-logging")]
mod file {
    use super::*;
    use tracing_appender::rolling;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{Layer, Registry};

    /// Keeps the non-blocking file writers alive; logs flush on drop
    pub struct LoggingGuard {
        _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
        log_dir: PathBuf,
    }

    impl LoggingGuard {
        /// Get the run folder path
        pub fn log_dir(&self) -> &Path {
            &self.log_dir
        }
    }

    /// Initialize console logging plus per-run JSON log files
    ///
    /// Falls back to an error if `config.log_dir` is unset.
    pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<LoggingGuard> {
        let base_log_dir = config
            .log_dir
            .clone()
            .ok_or_else(|| anyhow!("File logging requested without a log directory"))?;

        let run_folder = prepare_run_folder(&base_log_dir, config.retention_days, config.retention_runs, Utc::now())?;

        let filter = debug_flags.to_filter_string(&config.level);
        let console_filter = EnvFilter::try_new(&filter)
            .with_context(|| format!("Invalid log level: {}", config.level))?;
        let combined_filter = EnvFilter::try_new(&filter)
            .with_context(|| format!("Invalid log level: {}", config.level))?;

        let mut layers = Vec::new();
        let mut file_guards = Vec::new();

        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_filter(console_filter)
            .boxed();
        layers.push(console_layer);

        // One file per crate
        for crate_name in crate::KNOWN_CRATES {
            let file_appender = rolling::never(&run_folder, format!("{}.log", crate_name));
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            file_guards.push(guard);

            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(EnvFilter::new(format!("{}=debug,off", crate_name)))
                .boxed();
            layers.push(file_layer);
        }

        // Combined log file (all crates)
        let combined_appender = rolling::never(&run_folder, "navpos.log");
        let (combined_non_blocking, combined_guard) = tracing_appender::non_blocking(combined_appender);
        file_guards.push(combined_guard);

        let combined_layer = tracing_subscriber::fmt::layer()
            .with_writer(combined_non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(combined_filter)
            .boxed();
        layers.push(combined_layer);

        Registry::default()
            .with(layers)
            .try_init()
            .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

        Ok(LoggingGuard {
            _file_guards: file_guards,
            log_dir: run_folder,
        })
    }
}
