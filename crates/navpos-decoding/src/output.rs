// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Result files: `<name>_results.json` with the decoding report and
//! `<name>_args.json` with the parameters of the run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::decode::{DecodingReport, ALL_REGIONS};
use crate::error::{DecodingError, DecodingResult};

/// Fill `{region}`, `{date}` and `{jobid}` in an output template
///
/// Lists are joined with `-`; no regions means all of them.
pub fn format_output_name(template: &str, regions: &[String], dates: &[String], jobid: &str) -> String {
    let region = if regions.is_empty() {
        ALL_REGIONS.to_string()
    } else {
        regions.join("-")
    };
    template
        .replace("{region}", &region)
        .replace("{date}", &dates.join("-"))
        .replace("{jobid}", jobid)
}

/// Parameters of a decoding run, saved next to its results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunArgs {
    pub output_folder: PathBuf,
    pub output_template: String,
    pub jobid: String,
    pub use_inds: Option<Vec<usize>>,
    pub correct_only: bool,
    pub include_instructed: bool,
    pub regions: Vec<String>,
    pub decoder: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub results: PathBuf,
    pub args: PathBuf,
}

/// Write `value` as pretty-printed JSON
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> DecodingResult<()> {
    let content = serde_json::to_string_pretty(value).map_err(|source| DecodingError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, content).map_err(|source| DecodingError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the report and run parameters under `folder`, creating it if needed
pub fn write_outputs(
    folder: &Path,
    name: &str,
    report: &DecodingReport,
    args: &RunArgs,
) -> DecodingResult<OutputPaths> {
    fs::create_dir_all(folder).map_err(|source| DecodingError::Io {
        path: folder.to_path_buf(),
        source,
    })?;

    let paths = OutputPaths {
        results: folder.join(format!("{}_results.json", name)),
        args: folder.join(format!("{}_args.json", name)),
    };
    write_json(&paths.results, report)?;
    write_json(&paths.args, args)?;

    tracing::debug!(results = %paths.results.display(), args = %paths.args.display(), "wrote outputs");
    Ok(paths)
}
