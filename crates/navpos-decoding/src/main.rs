// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};

use navpos_config::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config, validate_config,
    ConfigError, NavposConfig,
};
use navpos_decoding::{
    decode_times, format_output_name, write_outputs, DecodeRequest, DecoderKind, RunArgs, ALL_REGIONS,
};
use navpos_observability::{
    debug_flags_help, init_console_logging, init_logging, parse_debug_flags, LogFormat,
    LoggingConfig as ObservabilityConfig,
};
use navpos_session::filters::mask_uninstructed_trials;
use navpos_session::{load_data_folder, mask_completed_trials, FolderSource, LoadOptions};

/// Decoding analysis on navigation data
#[derive(Parser, Debug)]
#[command(name = "navpos-decode", version, long_about = None, after_help = debug_flags_help())]
struct Args {
    /// Path to navpos_configuration.toml (searched for when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder with one sub-folder per session
    #[arg(long)]
    base_folder: Option<PathBuf>,

    /// Folder to save the output in [config default: .]
    #[arg(short = 'o', long)]
    output_folder: Option<PathBuf>,

    /// Output name template [config default: dec_{region}-{date}_{jobid}]
    #[arg(long)]
    output_template: Option<String>,

    /// Job identifier used in the output name [config default: 0000]
    #[arg(long)]
    jobid: Option<String>,

    /// Only load the sessions at these discovery indices
    #[arg(long, num_args = 1..)]
    use_inds: Option<Vec<usize>>,

    /// Load at most this many sessions
    #[arg(long)]
    max_files: Option<usize>,

    /// Keep only correct trials instead of all completed ones
    #[arg(long, default_value_t = false)]
    correct_only: bool,

    /// Keep instructed trials
    #[arg(long, default_value_t = false)]
    include_instructed: bool,

    /// Decode each of these regions separately instead of all neurons together
    #[arg(long, num_args = 1..)]
    regions: Option<Vec<String>>,

    /// Decoder: linear (nearest centroid), centroid or neighbors
    #[arg(long, default_value = "linear")]
    decoder: String,
}

impl Args {
    /// Command-line values that override the configuration file
    fn config_overrides(&self) -> HashMap<String, String> {
        let mut overrides = HashMap::new();
        let mut set = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                overrides.insert(key.to_string(), value);
            }
        };
        set("base_folder", self.base_folder.as_ref().map(|p| p.display().to_string()));
        set("output_folder", self.output_folder.as_ref().map(|p| p.display().to_string()));
        set("output_template", self.output_template.clone());
        set("jobid", self.jobid.clone());
        set("max_files", self.max_files.map(|n| n.to_string()));
        overrides
    }
}

/// Configuration from file, environment and command line, plus the file it came from
fn load_configuration(args: &Args) -> anyhow::Result<(NavposConfig, Option<PathBuf>)> {
    let overrides = args.config_overrides();

    let config_file = match &args.config {
        Some(path) => Some(path.clone()),
        None => match find_config_file() {
            Ok(path) => Some(path),
            Err(ConfigError::FileNotFound(_)) => None,
            Err(e) => return Err(e.into()),
        },
    };

    let config = match &config_file {
        Some(path) => load_config(Some(path.as_path()), Some(&overrides))
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => {
            let mut config = NavposConfig::default();
            apply_environment_overrides(&mut config);
            apply_cli_overrides(&mut config, &overrides);
            config
        }
    };

    validate_config(&config)?;
    Ok((config, config_file))
}

fn observability_config(config: &NavposConfig) -> ObservabilityConfig {
    ObservabilityConfig {
        level: config.logging.level.clone(),
        format: LogFormat::Text,
        log_dir: config.logging.log_dir.clone(),
        retention_days: config.logging.retention_days,
        retention_runs: config.logging.retention_runs,
    }
}

fn main() -> anyhow::Result<()> {
    // --debug-<crate> flags are read by the observability layer, not clap
    let debug_flags = parse_debug_flags();
    let args = Args::parse_from(env::args().filter(|arg| !arg.starts_with("--debug-")));

    let (config, config_file) = load_configuration(&args)?;

    let logging = observability_config(&config);
    let _log_guard = match logging.log_dir {
        Some(_) => Some(init_logging(&debug_flags, &logging)?),
        None => {
            init_console_logging(&debug_flags, &logging)?;
            None
        }
    };

    match &config_file {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }

    let mut options = LoadOptions::from_config(&config);
    if args.use_inds.is_some() {
        options.load_only_nth_files = args.use_inds.clone();
    }

    let source = FolderSource::from_config(&config.data);
    info!("Loading sessions from {}", source.base_folder.display());
    let data = load_data_folder(&source, &options)
        .with_context(|| format!("Failed to load sessions from {}", source.base_folder.display()))?;
    info!("Loaded {} sessions", data.len());

    let mut data_use = data.mask_with(|t| mask_completed_trials(t, args.correct_only))?;
    if !args.include_instructed {
        data_use = data_use.mask_with(mask_uninstructed_trials)?;
    }

    let decoder = DecoderKind::from_name(&args.decoder, config.decoding.neighbors).unwrap_or_else(|| {
        warn!("Unknown decoder '{}', using the linear decoder", args.decoder);
        DecoderKind::NearestCentroid
    });
    let request = DecodeRequest::from_config(&config.decoding, decoder, args.regions.clone());
    let report = decode_times(&data_use, &request)?;

    let regions = args
        .regions
        .clone()
        .unwrap_or_else(|| vec![ALL_REGIONS.to_string()]);
    let name = format_output_name(&config.output.template, &regions, &data_use.dates, &config.output.jobid);

    let run_args = RunArgs {
        output_folder: config.output.folder.clone(),
        output_template: config.output.template.clone(),
        jobid: config.output.jobid.clone(),
        use_inds: args.use_inds.clone(),
        correct_only: args.correct_only,
        include_instructed: args.include_instructed,
        regions,
        decoder: args.decoder.clone(),
        date: Utc::now(),
    };
    let paths = write_outputs(&config.output.folder, &name, &report, &run_args)?;

    info!("Decoded {} session/region groups", report.sessions.len());
    println!("{}", paths.results.display());
    Ok(())
}
