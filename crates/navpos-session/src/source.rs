// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Session discovery and raw artifact loading.
//!
//! A session folder is named `<subject>_<date>` (letters, underscore, digits)
//! and holds three JSON artifacts:
//!
//! ```text
//! Gulli_20230512/
//!   ├── spike_times.json          [[entry, ...], ...]       trial x neuron
//!   ├── 20230512_gulli_VR_behave.json   {"data_frame": {"<column>": [...], ...}}
//!   └── good_neurons.json         [{"region": "...", ...}, ...]
//! ```

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use navpos_config::DataConfig;

use crate::error::{SessionError, SessionResult};
use crate::spikes::{NeuronInfo, RawSpikes};
use crate::table::{Column, TrialTable};

/// Identity of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub subject: String,
    pub date: String,
    pub folder: PathBuf,
}

impl SessionInfo {
    /// Parse a `<letters>_<digits>` folder name
    pub fn from_folder(folder: &Path) -> SessionResult<Self> {
        let name = folder
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SessionError::InvalidSessionName(folder.display().to_string()))?;
        let (subject, date) = parse_session_name(name)
            .ok_or_else(|| SessionError::InvalidSessionName(name.to_string()))?;
        Ok(Self {
            subject: subject.to_string(),
            date: date.to_string(),
            folder: folder.to_path_buf(),
        })
    }
}

/// Split `Gulli_20230512` into `("Gulli", "20230512")`
pub fn parse_session_name(name: &str) -> Option<(&str, &str)> {
    let (subject, date) = name.split_once('_')?;
    let subject_ok = !subject.is_empty() && subject.chars().all(|c| c.is_ascii_alphabetic());
    let date_ok = !date.is_empty() && date.chars().all(|c| c.is_ascii_digit());
    (subject_ok && date_ok).then_some((subject, date))
}

/// True for `<digits>_<lowercase><suffix>`, e.g. `20230512_gulli_VR_behave.json`
pub fn is_behavior_file(name: &str, suffix: &str) -> bool {
    let Some(stem) = name.strip_suffix(suffix) else {
        return false;
    };
    let Some((date, subject)) = stem.split_once('_') else {
        return false;
    };
    !date.is_empty()
        && date.chars().all(|c| c.is_ascii_digit())
        && !subject.is_empty()
        && subject.chars().all(|c| c.is_ascii_lowercase())
}

/// The three raw artifacts of one session
#[derive(Debug, Clone)]
pub struct RawSession {
    pub info: SessionInfo,
    pub spikes: RawSpikes,
    pub behavior: TrialTable,
    pub good_neurons: Vec<NeuronInfo>,
}

/// Where sessions come from
pub trait SessionSource {
    /// All sessions, in load order
    fn discover(&self) -> SessionResult<Vec<SessionInfo>>;

    /// Load the raw artifacts of one session
    fn load(&self, info: &SessionInfo) -> SessionResult<RawSession>;
}

/// Sessions stored as JSON artifacts under one base folder
#[derive(Debug, Clone)]
pub struct FolderSource {
    pub base_folder: PathBuf,
    pub spikes_file: String,
    pub good_neurons_file: String,
    pub behavior_suffix: String,
}

impl FolderSource {
    pub fn new(base_folder: impl Into<PathBuf>) -> Self {
        Self::from_config(&DataConfig {
            base_folder: base_folder.into(),
            ..DataConfig::default()
        })
    }

    pub fn from_config(config: &DataConfig) -> Self {
        Self {
            base_folder: config.base_folder.clone(),
            spikes_file: config.spikes_file.clone(),
            good_neurons_file: config.good_neurons_file.clone(),
            behavior_suffix: config.behavior_suffix.clone(),
        }
    }

    fn find_behavior_file(&self, folder: &Path) -> SessionResult<PathBuf> {
        let mut matches: Vec<PathBuf> = read_dir_paths(folder)?
            .into_iter()
            .filter(|p| {
                p.is_file()
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| is_behavior_file(n, &self.behavior_suffix))
            })
            .collect();
        matches.sort();
        matches
            .into_iter()
            .next()
            .ok_or_else(|| SessionError::MissingArtifact {
                folder: folder.to_path_buf(),
                artifact: format!("behavior file (*{})", self.behavior_suffix),
            })
    }

    fn require(&self, folder: &Path, file_name: &str) -> SessionResult<PathBuf> {
        let path = folder.join(file_name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(SessionError::MissingArtifact {
                folder: folder.to_path_buf(),
                artifact: file_name.to_string(),
            })
        }
    }
}

fn read_dir_paths(folder: &Path) -> SessionResult<Vec<PathBuf>> {
    let io_err = |source| SessionError::Io {
        path: folder.to_path_buf(),
        source,
    };
    fs::read_dir(folder)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()).map_err(io_err))
        .collect()
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> SessionResult<T> {
    let content = fs::read_to_string(path).map_err(|source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| SessionError::Json {
        path: path.to_path_buf(),
        source,
    })
}

impl SessionSource for FolderSource {
    fn discover(&self) -> SessionResult<Vec<SessionInfo>> {
        let mut sessions: Vec<SessionInfo> = read_dir_paths(&self.base_folder)?
            .into_iter()
            .filter(|p| p.is_dir())
            .filter_map(|p| SessionInfo::from_folder(&p).ok())
            .collect();
        sessions.sort_by(|a, b| a.folder.cmp(&b.folder));
        tracing::debug!(
            base_folder = %self.base_folder.display(),
            sessions = sessions.len(),
            "discovered session folders"
        );
        Ok(sessions)
    }

    fn load(&self, info: &SessionInfo) -> SessionResult<RawSession> {
        let spikes: RawSpikes = read_json(&self.require(&info.folder, &self.spikes_file)?)?;
        let good_neurons: Vec<NeuronInfo> =
            read_json(&self.require(&info.folder, &self.good_neurons_file)?)?;

        let behavior_path = self.find_behavior_file(&info.folder)?;
        let behavior_file: BehaviorFile = read_json(&behavior_path)?;
        let behavior = behavior_table(behavior_file.data_frame)?;

        Ok(RawSession {
            info: info.clone(),
            spikes,
            behavior,
            good_neurons,
        })
    }
}

/// Behavior artifact payload
#[derive(Debug, Deserialize)]
pub struct BehaviorFile {
    pub data_frame: BTreeMap<String, Vec<Value>>,
}

/// Build a trial table from raw JSON columns, inferring each column's type
pub fn behavior_table(columns: BTreeMap<String, Vec<Value>>) -> SessionResult<TrialTable> {
    let mut table = TrialTable::new();
    for (field, values) in columns {
        let column = infer_column(&field, values)?;
        table.insert(field, column)?;
    }
    Ok(table)
}

/// Infer a typed column from JSON values
///
/// Numbers and nulls give `Number`; booleans give `Flag`; arrays of numbers
/// (null allowed, both as a whole trial and per sample) give `Series`;
/// strings give `Text`.
pub fn infer_column(field: &str, values: Vec<Value>) -> SessionResult<Column> {
    let unsupported = |reason: &str| SessionError::UnsupportedColumn {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    let non_null = values.iter().find(|v| !v.is_null());
    match non_null {
        None | Some(Value::Null) | Some(Value::Number(_)) => values
            .iter()
            .map(|v| match v {
                Value::Null => Ok(None),
                Value::Number(n) => Ok(n.as_f64()),
                _ => Err(unsupported("mixed numbers and non-numbers")),
            })
            .collect::<SessionResult<_>>()
            .map(Column::Number),
        Some(Value::Bool(_)) => values
            .iter()
            .map(|v| v.as_bool().ok_or_else(|| unsupported("mixed booleans and non-booleans")))
            .collect::<SessionResult<_>>()
            .map(Column::Flag),
        Some(Value::Array(_)) => values
            .iter()
            .map(|v| match v {
                Value::Null => Ok(Vec::new()),
                Value::Array(samples) => samples
                    .iter()
                    .map(|s| match s {
                        Value::Null => Ok(f64::NAN),
                        Value::Number(n) => n.as_f64().ok_or_else(|| unsupported("unrepresentable number")),
                        _ => Err(unsupported("series with non-numeric samples")),
                    })
                    .collect::<SessionResult<Vec<f64>>>(),
                _ => Err(unsupported("mixed arrays and scalars")),
            })
            .collect::<SessionResult<_>>()
            .map(Column::Series),
        Some(Value::String(_)) => values
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                _ => Err(unsupported("mixed strings and non-strings")),
            })
            .collect::<SessionResult<_>>()
            .map(Column::Text),
        Some(Value::Object(_)) => Err(unsupported("nested objects are not supported")),
    }
}
