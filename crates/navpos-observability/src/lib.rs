// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! # navpos-observability
//!
//! Unified logging for the navpos crates, with per-crate debug flag support.
//!
//! ## Features
//! - `file-logging`: timestamped per-run JSON log files with retention cleanup

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod config;
pub mod init;

pub use cli::*;
pub use config::*;
pub use init::*;

/// Known navpos crate names for debug flags
///
/// These are tracing targets, so they use the underscore form of the crate name.
pub const KNOWN_CRATES: &[&str] = &[
    "navpos",
    "navpos_config",
    "navpos_session",
    "navpos_decoding",
];
