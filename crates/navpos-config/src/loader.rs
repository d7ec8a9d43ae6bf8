// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, NavposConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "navpos_configuration.toml";

/// Find the navpos configuration file
///
/// Search order:
/// 1. `NAVPOS_CONFIG_PATH` environment variable
/// 2. Current working directory: `./navpos_configuration.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("NAVPOS_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by NAVPOS_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();

    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet NAVPOS_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<NavposConfig> {
    let config_file = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        find_config_file()?
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: NavposConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NAVPOS_BASE_FOLDER` -> `data.base_folder`
/// - `NAVPOS_MAX_FILES` -> `data.max_files`
/// - `NAVPOS_BORDER` -> `crossings.border`
/// - `NAVPOS_THRESHOLD` -> `crossings.threshold`
/// - `NAVPOS_OUTPUT_FOLDER` -> `output.folder`
/// - `NAVPOS_JOBID` -> `output.jobid`
/// - `NAVPOS_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut NavposConfig) {
    let vars: HashMap<String, String> = [
        ("NAVPOS_BASE_FOLDER", "base_folder"),
        ("NAVPOS_MAX_FILES", "max_files"),
        ("NAVPOS_BORDER", "border"),
        ("NAVPOS_THRESHOLD", "threshold"),
        ("NAVPOS_OUTPUT_FOLDER", "output_folder"),
        ("NAVPOS_JOBID", "jobid"),
        ("NAVPOS_LOG_LEVEL", "log_level"),
    ]
    .into_iter()
    .filter_map(|(var, key)| env::var(var).ok().map(|value| (key.to_string(), value)))
    .collect();

    apply_cli_overrides(config, &vars);
}

/// Apply CLI argument overrides to configuration
///
/// Values that fail to parse are ignored and the previous value is kept.
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"border": "480", "jobid": "17"}`)
pub fn apply_cli_overrides(config: &mut NavposConfig, cli_args: &HashMap<String, String>) {
    // Data settings
    if let Some(value) = cli_args.get("base_folder") {
        config.data.base_folder = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("max_files") {
        if let Ok(max_files) = value.parse::<usize>() {
            config.data.max_files = Some(max_files);
        }
    }

    // Crossing detection
    if let Some(value) = cli_args.get("border") {
        if let Ok(border) = value.parse::<f64>() {
            config.crossings.border = border;
        }
    }
    if let Some(value) = cli_args.get("threshold") {
        if let Ok(threshold) = value.parse::<f64>() {
            config.crossings.threshold = threshold;
        }
    }

    // Output settings
    if let Some(value) = cli_args.get("output_folder") {
        config.output.folder = PathBuf::from(value);
    }
    if let Some(value) = cli_args.get("output_template") {
        config.output.template = value.clone();
    }
    if let Some(value) = cli_args.get("jobid") {
        config.output.jobid = value.clone();
    }

    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}
