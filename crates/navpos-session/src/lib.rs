// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! # Navpos Session
//!
//! Loads spatial-navigation recording sessions and turns them into per-trial
//! tables enriched with spikes and derived behavioral features.
//!
//! ## Pipeline
//!
//! - [`source`]: discover session folders and read their raw artifacts
//! - [`spikes`]: trial x neuron spike times with region labels
//! - [`rename`]: canonical names for raw behavior fields
//! - [`extract`]: sample a time series at a per-trial timestamp
//! - [`rotation`]: bin headings to the nearest cardinal direction
//! - [`crossings`]: border crossings of position traces
//! - [`loader`]: run all of the above per session
//! - [`filters`]: trial masks applied after loading
//!
//! ## Usage
//!
//! ```no_run
//! use navpos_session::{load_data_folder, mask_completed_trials, FolderSource, LoadOptions};
//!
//! let source = FolderSource::new("../data/navigation_position/");
//! let sessions = load_data_folder(&source, &LoadOptions::default())?;
//! let correct = sessions.mask_with(|t| mask_completed_trials(t, true))?;
//! # Ok::<(), navpos_session::SessionError>(())
//! ```

pub mod crossings;
pub mod error;
pub mod extract;
pub mod fields;
pub mod filters;
pub mod loader;
pub mod rename;
pub mod rotation;
pub mod source;
pub mod spikes;
pub mod table;

pub use crossings::{find_crossings, relevant_crossing, relevant_crossings, Crossing, CrossingParams, TrialCrossings};
pub use error::{SessionError, SessionResult};
pub use extract::{extract_time_field, sample_at};
pub use filters::{mask_completed_trials, mask_uninstructed_trials};
pub use loader::{load_data_folder, process_session, LoadOptions, SessionCollection, SessionView};
pub use rename::{default_renames, rename_fields, FieldRenames};
pub use rotation::{discretize_rotation, RotationBins};
pub use source::{FolderSource, RawSession, SessionInfo, SessionSource};
pub use spikes::{organize_spikes, NeuronInfo, OrganizedSpikes, SpikeEntry};
pub use table::{Column, TrialSpikes, TrialTable};
