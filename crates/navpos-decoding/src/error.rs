// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use navpos_session::SessionError;

/// Result type for decoding operations
pub type DecodingResult<T> = Result<T, DecodingError>;

/// Errors that can occur while building features, fitting decoders or writing results
#[derive(Debug, thiserror::Error)]
pub enum DecodingError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Target field {field} cannot be used as a class label: {reason}")]
    UnsupportedTarget { field: String, reason: String },

    #[error("Decoder has not been fitted")]
    NotFitted,

    #[error("Cannot fit a decoder on an empty training set")]
    EmptyTrainingSet,

    #[error("Feature matrix has {actual} rows, labels have {expected}")]
    LabelLength { expected: usize, actual: usize },

    #[error("Feature matrix has {actual} columns, decoder was fitted on {expected}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("Trial {trial} has {actual} features, other trials have {expected}")]
    RaggedFeatures { trial: usize, expected: usize, actual: usize },

    #[error("Cross-validation needs at least 2 folds and one trial per fold (folds: {folds}, trials: {trials})")]
    InvalidFolds { folds: usize, trials: usize },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
