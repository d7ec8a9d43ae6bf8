// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `navpos_configuration.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NavposConfig {
    pub data: DataConfig,
    pub crossings: CrossingsConfig,
    pub rotation: RotationConfig,
    pub rename: RenameConfig,
    pub decoding: DecodingConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Session discovery and loading
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DataConfig {
    pub base_folder: PathBuf,
    pub spikes_file: String,
    pub good_neurons_file: String,
    /// Behavior files are `<digits>_<lowercase>` followed by this suffix
    pub behavior_suffix: String,
    /// Stop after this many sessions; unset loads everything
    pub max_files: Option<usize>,
    /// Load only these session indices (discovery order)
    pub load_only_nth_files: Option<Vec<usize>>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_folder: PathBuf::from("../data/navigation_position/"),
            spikes_file: "spike_times.json".to_string(),
            good_neurons_file: "good_neurons.json".to_string(),
            behavior_suffix: "_VR_behave.json".to_string(),
            max_files: None,
            load_only_nth_files: None,
        }
    }
}

/// Border-crossing detection, in position-trace units
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CrossingsConfig {
    pub border: f64,
    pub threshold: f64,
}

impl Default for CrossingsConfig {
    fn default() -> Self {
        Self {
            border: 500.0,
            threshold: 2.0,
        }
    }
}

/// Heading discretization, in degrees
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RotationConfig {
    pub centers: Vec<f64>,
    pub width: f64,
    pub period: f64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            centers: vec![0.0, 90.0, 180.0, 270.0],
            width: 90.0,
            period: 360.0,
        }
    }
}

/// Field rename tables (raw name -> canonical name)
///
/// `None` means "use the built-in table". `extra` is applied last and wins
/// over both built-in tables for duplicate raw names.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RenameConfig {
    pub timing: Option<BTreeMap<String, String>>,
    pub info: Option<BTreeMap<String, String>>,
    pub extra: BTreeMap<String, String>,
}

/// Decoding analysis settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DecodingConfig {
    /// Trial field holding the class label
    pub target_field: String,
    /// Trial field holding the alignment time
    pub event_field: String,
    /// Window starts relative to the event
    pub window_offsets: Vec<f64>,
    pub window_width: f64,
    pub folds: usize,
    pub neighbors: usize,
}

impl Default for DecodingConfig {
    fn default() -> Self {
        Self {
            target_field: "white_right".to_string(),
            event_field: "approach_start".to_string(),
            window_offsets: vec![-1000.0, -500.0, 0.0, 500.0],
            window_width: 500.0,
            folds: 5,
            neighbors: 5,
        }
    }
}

/// Result persistence
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub folder: PathBuf,
    pub template: String,
    pub jobid: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("."),
            template: "dec_{region}-{date}_{jobid}".to_string(),
            jobid: "0000".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Per-run log files are written here when set
    pub log_dir: Option<PathBuf>,
    pub retention_days: u64,
    pub retention_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            retention_days: 30,
            retention_runs: 10,
        }
    }
}

impl OutputConfig {
    /// Placeholders the output template may use
    pub const PLACEHOLDERS: [&'static str; 3] = ["region", "date", "jobid"];
}
