// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Decoding of trial variables from spike counts.
//!
//! Sessions loaded by `navpos-session` are turned into trials x neurons
//! count matrices around an alignment event, and a classifier is
//! cross-validated at each window offset. The `navpos-decode` binary runs the
//! whole pipeline and writes the results as JSON.

pub mod decode;
pub mod decoder;
pub mod error;
pub mod features;
pub mod output;

// Re-export key types for convenience
pub use decode::{decode_times, DecodeRequest, DecodingReport, SessionDecoding, WindowScore, ALL_REGIONS};
pub use decoder::{cross_validate, Decoder, DecoderKind, KNearestNeighbors, NearestCentroid};
pub use error::{DecodingError, DecodingResult};
pub use features::{class_labels, labeled_counts, spike_counts, Dataset, Window};
pub use output::{format_output_name, write_outputs, OutputPaths, RunArgs};
