// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! # navpos - Navigation Position Analysis
//!
//! Loads spatial-navigation recording sessions, aligns spike trains with
//! behavioral trials, derives trial features (choice heading, border
//! crossings, outcome flags) and decodes trial variables from spike counts.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! navpos = "0.1"  # Default: session loading + decoding
//! ```
//!
//! ## Feature Flags
//!
//! - **`decoding`** (default): spike-count decoders and the `navpos-decode` binary
//!
//! ## Usage
//!
//! ```rust,no_run
//! use navpos::prelude::*;
//!
//! let config = navpos::config::load_config(None, None)?;
//! let source = FolderSource::from_config(&config.data);
//! let sessions = load_data_folder(&source, &LoadOptions::from_config(&config))?;
//!
//! for session in sessions.iter() {
//!     println!("{} {}: {} trials", session.subject, session.date, session.data.n_rows());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: navpos-config                              │
//! │  (TOML + environment + CLI overrides, validation)       │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Session: navpos-session                                │
//! │  (trial tables, alignment, crossings, rotation bins)    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Analysis: navpos-decoding                              │
//! │  (spike counts, cross-validated decoders, JSON output)  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! `navpos-observability` provides logging for all layers.
//!
//! ## License
//!
//! Apache-2.0

// Re-export foundation
pub use navpos_config as config;

// Re-export infrastructure
pub use navpos_observability as observability;

// Re-export session layer
pub use navpos_session as session;

// Re-export analysis
#[cfg(feature = "decoding")]
pub use navpos_decoding as decoding;

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::config::NavposConfig;

    pub use crate::session::{
        load_data_folder, mask_completed_trials, Column, FolderSource, LoadOptions, SessionCollection,
        SessionSource, TrialTable,
    };
    pub use crate::session::filters::mask_uninstructed_trials;

    #[cfg(feature = "decoding")]
    pub use crate::decoding::{decode_times, DecodeRequest, DecoderKind, DecodingReport};
}
