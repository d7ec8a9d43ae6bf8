// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Session orchestration: raw artifacts in, enriched trial tables out.
//!
//! Per session:
//! 1. organize spikes
//! 2. reconcile behavior and spike trial counts (truncate from the end)
//! 3. attach spikes and region labels
//! 4. derive `completed_trial` and `correct_trial` from the outcome code
//! 5. copy raw fields to canonical names
//! 6. derive `white_right`
//! 7. sample the heading at the end of the second automatic rotation
//! 8. bin that heading
//! 9. detect border crossings on both planar axes
//! 10. select the last crossing before object approach on both axes

use std::collections::BTreeSet;

use navpos_config::NavposConfig;

use crate::crossings::{find_crossings, relevant_crossings, CrossingParams, TrialCrossings};
use crate::error::SessionResult;
use crate::extract::extract_time_field;
use crate::fields::*;
use crate::rename::{default_renames, rename_fields, renames_from_config, FieldRenames};
use crate::rotation::{discretize_rotation, RotationBins};
use crate::source::{RawSession, SessionInfo, SessionSource};
use crate::spikes::organize_spikes;
use crate::table::{Column, TrialTable};

/// Everything the orchestrator needs besides the data itself
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub crossings: CrossingParams,
    pub rotation: RotationBins,
    /// Applied in order; later tables win for duplicate raw names
    pub renames: Vec<FieldRenames>,
    /// Stop once this many sessions are processed
    pub max_files: Option<usize>,
    /// Only these discovery indices are loaded
    pub load_only_nth_files: Option<Vec<usize>>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            crossings: CrossingParams::default(),
            rotation: RotationBins::default(),
            renames: default_renames(),
            max_files: None,
            load_only_nth_files: None,
        }
    }
}

impl LoadOptions {
    pub fn from_config(config: &NavposConfig) -> Self {
        Self {
            crossings: CrossingParams::from(&config.crossings),
            rotation: RotationBins::from(&config.rotation),
            renames: renames_from_config(&config.rename),
            max_files: config.data.max_files,
            load_only_nth_files: config.data.load_only_nth_files.clone(),
        }
    }
}

/// Per-session results as parallel sequences; sessions are never merged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionCollection {
    pub dates: Vec<String>,
    pub subjects: Vec<String>,
    pub data: Vec<TrialTable>,
    pub n_neurons: Vec<usize>,
}

/// Borrowed view of one session in a [`SessionCollection`]
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    pub date: &'a str,
    pub subject: &'a str,
    pub data: &'a TrialTable,
    pub n_neurons: usize,
}

impl SessionCollection {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn push(&mut self, info: &SessionInfo, data: TrialTable, n_neurons: usize) {
        self.dates.push(info.date.clone());
        self.subjects.push(info.subject.clone());
        self.data.push(data);
        self.n_neurons.push(n_neurons);
    }

    pub fn iter(&self) -> impl Iterator<Item = SessionView<'_>> {
        self.dates
            .iter()
            .zip(&self.subjects)
            .zip(&self.data)
            .zip(&self.n_neurons)
            .map(|(((date, subject), data), &n_neurons)| SessionView {
                date,
                subject,
                data,
                n_neurons,
            })
    }

    /// Apply a trial filter to every session, keeping session metadata
    pub fn mask_with<F>(&self, filter: F) -> SessionResult<SessionCollection>
    where
        F: Fn(&TrialTable) -> SessionResult<TrialTable>,
    {
        let data = self.data.iter().map(filter).collect::<SessionResult<Vec<_>>>()?;
        Ok(SessionCollection {
            dates: self.dates.clone(),
            subjects: self.subjects.clone(),
            data,
            n_neurons: self.n_neurons.clone(),
        })
    }
}

fn is_value(value: &Option<f64>, target: f64) -> bool {
    *value == Some(target)
}

/// `(IsEast == 1 && target_right == 1) || (IsEast == 0 && target_right == 0)`
pub fn white_right(is_east: &[Option<f64>], target_right: &[Option<f64>]) -> Vec<bool> {
    is_east
        .iter()
        .zip(target_right)
        .map(|(east, right)| {
            (is_value(east, 1.0) && is_value(right, 1.0)) || (is_value(east, 0.0) && is_value(right, 0.0))
        })
        .collect()
}

fn insert_crossings(
    table: &mut TrialTable,
    crossings: Vec<TrialCrossings>,
    times_field: &str,
    dir_field: &str,
) -> SessionResult<()> {
    let (times, upward): (Vec<_>, Vec<_>) = crossings.into_iter().map(|c| (c.times, c.upward)).unzip();
    table.insert(times_field, Column::Events(times))?;
    table.insert(dir_field, Column::Directions(upward))
}

/// Enrich one session's behavior table with spikes and derived trial features
///
/// # Errors
///
/// Missing or mistyped fields and out-of-range rotation timestamps are fatal.
/// A trial-count mismatch between behavior and spikes is repaired by
/// truncating the longer side from the end.
pub fn process_session(raw: RawSession, options: &LoadOptions) -> SessionResult<TrialTable> {
    let RawSession {
        info,
        spikes,
        mut behavior,
        good_neurons,
    } = raw;

    let mut organized = organize_spikes(&spikes, &good_neurons);

    let n_behavior = behavior.n_rows();
    let n_spikes = organized.n_trials();
    if n_behavior != n_spikes {
        tracing::warn!(
            subject = %info.subject,
            date = %info.date,
            folder = %info.folder.display(),
            "difference in length between data ({}) and spikes ({}), keeping the first {} trials",
            n_behavior,
            n_spikes,
            n_behavior.min(n_spikes)
        );
        behavior.truncate(n_spikes);
        organized.truncate(n_behavior);
    }

    let mut table = behavior;
    table.insert(SPIKE_TIMES, Column::Spikes(organized.spike_times))?;
    table.insert(NEURON_REGIONS, Column::Regions(organized.regions))?;

    let outcome = table.numbers(TRIAL_ERROR)?;
    let completed = outcome
        .iter()
        .map(|code| COMPLETED_CODES.iter().any(|c| is_value(code, *c)))
        .collect();
    let correct = outcome.iter().map(|code| is_value(code, CORRECT_CODE)).collect();
    table.insert(COMPLETED_TRIAL, Column::Flag(completed))?;
    table.insert(CORRECT_TRIAL, Column::Flag(correct))?;

    rename_fields(&mut table, &options.renames)?;

    let white = white_right(table.numbers(IS_EAST)?, table.numbers(TARGET_RIGHT)?);
    table.insert(WHITE_RIGHT, Column::Flag(white))?;

    let pre_choice = extract_time_field(&table, POST_ROTATION_END, ROTATION_TRACE)?;
    let choice = discretize_rotation(&pre_choice, &options.rotation);
    table.insert(PRE_CHOICE_ROTATION, Column::Number(pre_choice))?;
    table.insert(CHOICE_ROTATION, Column::Category(choice))?;

    let crossings_x = find_crossings(table.series(POS_X)?, &options.crossings);
    let crossings_y = find_crossings(table.series(POS_Y)?, &options.crossings);
    insert_crossings(&mut table, crossings_x, BORDER_CROSSING_X, BORDER_CROSSING_X_DIR)?;
    insert_crossings(&mut table, crossings_y, BORDER_CROSSING_Y, BORDER_CROSSING_Y_DIR)?;

    let approach = table.numbers(APPROACH_START)?;
    let relevant_x = relevant_crossings(table.events(BORDER_CROSSING_X)?, approach);
    let relevant_y = relevant_crossings(table.events(BORDER_CROSSING_Y)?, approach);
    table.insert(RELEVANT_CROSSING_X, Column::Number(relevant_x))?;
    table.insert(RELEVANT_CROSSING_Y, Column::Number(relevant_y))?;

    tracing::debug!(
        subject = %info.subject,
        date = %info.date,
        trials = table.n_rows(),
        columns = table.n_columns(),
        "session enriched"
    );
    Ok(table)
}

/// Sessions to load, in discovery order, after `load_only_nth_files`
fn select_sessions(mut sessions: Vec<SessionInfo>, only: Option<&[usize]>) -> Vec<SessionInfo> {
    let Some(only) = only else {
        return sessions;
    };
    let wanted: BTreeSet<usize> = only.iter().copied().collect();
    for &index in wanted.range(sessions.len()..) {
        tracing::warn!(index, available = sessions.len(), "requested session index does not exist");
    }
    let mut index = 0;
    sessions.retain(|_| {
        let keep = wanted.contains(&index);
        index += 1;
        keep
    });
    sessions
}

/// Load and enrich every session a source provides
///
/// # Errors
///
/// Any discovery, load or [`process_session`] error aborts the whole batch.
pub fn load_data_folder<S: SessionSource + ?Sized>(
    source: &S,
    options: &LoadOptions,
) -> SessionResult<SessionCollection> {
    let sessions = select_sessions(source.discover()?, options.load_only_nth_files.as_deref());

    let mut collection = SessionCollection::default();
    let mut files_loaded = 0;
    for info in sessions {
        if options.max_files.is_some_and(|max| files_loaded >= max) {
            break;
        }

        let raw = source.load(&info)?;
        let n_neurons = raw.good_neurons.len();
        let table = process_session(raw, options)?;
        tracing::info!(
            subject = %info.subject,
            date = %info.date,
            trials = table.n_rows(),
            neurons = n_neurons,
            "loaded session"
        );
        collection.push(&info, table, n_neurons);
        files_loaded += 1;
    }

    Ok(collection)
}
