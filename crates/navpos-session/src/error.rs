// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while loading and enriching sessions
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Field {field} has type {found}, expected {expected}")]
    ColumnType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Column {field} has {actual} rows, table has {expected}")]
    ColumnLength {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Mask has {actual} entries, table has {expected} rows")]
    MaskLength { expected: usize, actual: usize },

    #[error("Time index {index} out of range for trial {trial} (series length {len})")]
    TimeIndexOutOfRange { trial: usize, index: usize, len: usize },

    #[error("Invalid time index {value} for trial {trial}")]
    InvalidTimeIndex { trial: usize, value: f64 },

    #[error("Unsupported column {field}: {reason}")]
    UnsupportedColumn { field: String, reason: String },

    #[error("Invalid session folder name: {0}")]
    InvalidSessionName(String),

    #[error("Missing {artifact} in session folder {folder}")]
    MissingArtifact { folder: PathBuf, artifact: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
