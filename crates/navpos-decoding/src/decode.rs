// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Time-resolved decoding across sessions.

use std::collections::BTreeSet;

use navpos_config::DecodingConfig;
use navpos_session::fields::NEURON_REGIONS;
use navpos_session::{SessionCollection, SessionView};
use rayon::prelude::*;
use serde::Serialize;

use crate::decoder::{cross_validate, DecoderKind};
use crate::error::DecodingResult;
use crate::features::{class_labels, labeled_counts, neuron_mask, usable_trials, Window};

/// Region group name used when no regions are requested
pub const ALL_REGIONS: &str = "all";

/// What to decode, from which neurons, and when
#[derive(Debug, Clone)]
pub struct DecodeRequest {
    pub target_field: String,
    pub event_field: String,
    pub window_offsets: Vec<f64>,
    pub window_width: f64,
    pub folds: usize,
    pub decoder: DecoderKind,
    /// One decoding per region; all neurons together when `None`
    pub regions: Option<Vec<String>>,
}

impl DecodeRequest {
    pub fn from_config(config: &DecodingConfig, decoder: DecoderKind, regions: Option<Vec<String>>) -> Self {
        Self {
            target_field: config.target_field.clone(),
            event_field: config.event_field.clone(),
            window_offsets: config.window_offsets.clone(),
            window_width: config.window_width,
            folds: config.folds,
            decoder,
            regions,
        }
    }

    /// `(group name, neuron filter)` pairs
    fn region_groups(&self) -> Vec<(String, Option<Vec<String>>)> {
        match &self.regions {
            None => vec![(ALL_REGIONS.to_string(), None)],
            Some(regions) => regions.iter().map(|r| (r.clone(), Some(vec![r.clone()]))).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowScore {
    /// Window start relative to the event
    pub offset: f64,
    /// Cross-validated fraction of correctly decoded trials
    pub accuracy: f64,
}

/// Decoding of one region group in one session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionDecoding {
    pub subject: String,
    pub date: String,
    pub region: String,
    pub n_neurons: usize,
    pub n_trials: usize,
    pub scores: Vec<WindowScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodingReport {
    pub target_field: String,
    pub event_field: String,
    pub window_width: f64,
    pub folds: usize,
    pub decoder: String,
    pub sessions: Vec<SessionDecoding>,
}

/// Why a session cannot be decoded, if it cannot
fn skip_reason(n_trials: usize, n_classes: usize, folds: usize) -> Option<String> {
    if n_classes < 2 {
        Some(format!("{} class(es) in target", n_classes))
    } else if n_trials < folds {
        Some(format!("{} usable trials for {} folds", n_trials, folds))
    } else {
        None
    }
}

fn decode_session(session: SessionView<'_>, request: &DecodeRequest) -> DecodingResult<Vec<SessionDecoding>> {
    let table = session.data;
    let labels = class_labels(table, &request.target_field)?;
    let events = table.numbers(&request.event_field)?;
    let usable = usable_trials(&labels, events);
    let n_classes = usable
        .iter()
        .filter_map(|&i| labels[i])
        .collect::<BTreeSet<_>>()
        .len();

    if let Some(reason) = skip_reason(usable.len(), n_classes, request.folds) {
        tracing::warn!(
            subject = session.subject,
            date = session.date,
            "skipping session: {}",
            reason
        );
        return Ok(Vec::new());
    }

    let neuron_labels = table.regions(NEURON_REGIONS)?.first().cloned().unwrap_or_else(|| Vec::new().into());

    let mut results = Vec::new();
    for (region, filter) in request.region_groups() {
        let filter = filter.as_deref();
        let n_neurons = neuron_mask(&neuron_labels, filter).into_iter().filter(|&k| k).count();
        if n_neurons == 0 {
            tracing::warn!(
                subject = session.subject,
                date = session.date,
                region = %region,
                "no neurons in region, skipping"
            );
            continue;
        }

        let scores = request
            .window_offsets
            .par_iter()
            .map(|&offset| {
                let window = Window::new(offset, request.window_width);
                let data = labeled_counts(table, &request.target_field, &request.event_field, window, filter)?;
                let mut decoder = request.decoder.build();
                let accuracy = cross_validate(decoder.as_mut(), data.x.view(), &data.y, request.folds)?;
                Ok(WindowScore { offset, accuracy })
            })
            .collect::<DecodingResult<Vec<_>>>()?;

        tracing::info!(
            subject = session.subject,
            date = session.date,
            region = %region,
            neurons = n_neurons,
            trials = usable.len(),
            "decoded {} windows",
            scores.len()
        );
        results.push(SessionDecoding {
            subject: session.subject.to_string(),
            date: session.date.to_string(),
            region,
            n_neurons,
            n_trials: usable.len(),
            scores,
        });
    }
    Ok(results)
}

/// Decode `request.target_field` in every session, region group and window
///
/// Window offsets are evaluated in parallel. Sessions with fewer than two
/// classes, or fewer usable trials than folds, are skipped with a warning.
pub fn decode_times(collection: &SessionCollection, request: &DecodeRequest) -> DecodingResult<DecodingReport> {
    let mut sessions = Vec::new();
    for session in collection.iter() {
        sessions.extend(decode_session(session, request)?);
    }

    Ok(DecodingReport {
        target_field: request.target_field.clone(),
        event_field: request.event_field.clone(),
        window_width: request.window_width,
        folds: request.folds,
        decoder: request.decoder.to_string(),
        sessions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use navpos_session::fields::SPIKE_TIMES;
    use navpos_session::{Column, SessionInfo, TrialTable};
    use ndarray::Array1;
    use std::path::Path;
    use std::sync::Arc;

    /// HPC neuron fires only on `white_right` trials, just after the event
    fn session_table(n_trials: usize) -> TrialTable {
        let labels: Arc<[String]> = vec!["HPC".to_string(), "OFC".to_string()].into();
        let white: Vec<bool> = (0..n_trials).map(|i| i % 2 == 0).collect();
        let spikes = white
            .iter()
            .map(|&w| {
                let hpc = if w { vec![1010.0, 1020.0, 1030.0] } else { vec![] };
                vec![Array1::from(hpc), Array1::from(vec![500.0, 1500.0])]
            })
            .collect();
        TrialTable::from_columns([
            ("white_right", Column::Flag(white)),
            ("approach_start", Column::Number(vec![Some(1000.0); n_trials])),
            (SPIKE_TIMES, Column::Spikes(spikes)),
            (NEURON_REGIONS, Column::Regions(vec![labels; n_trials])),
        ])
        .unwrap()
    }

    fn collection(tables: Vec<TrialTable>) -> SessionCollection {
        let mut collection = SessionCollection::default();
        for (i, table) in tables.into_iter().enumerate() {
            let info = SessionInfo::from_folder(Path::new(&format!("Gulli_2023051{}", i))).unwrap();
            collection.push(&info, table, 2);
        }
        collection
    }

    fn request(regions: Option<Vec<String>>) -> DecodeRequest {
        DecodeRequest {
            target_field: "white_right".to_string(),
            event_field: "approach_start".to_string(),
            window_offsets: vec![-500.0, 0.0],
            window_width: 100.0,
            folds: 5,
            decoder: DecoderKind::NearestCentroid,
            regions,
        }
    }

    #[test]
    fn test_decoding_tracks_informative_window() {
        let report = decode_times(&collection(vec![session_table(20)]), &request(None)).unwrap();

        assert_eq!(report.decoder, "centroid");
        assert_eq!(report.sessions.len(), 1);
        let session = &report.sessions[0];
        assert_eq!(session.region, ALL_REGIONS);
        assert_eq!(session.n_neurons, 2);
        assert_eq!(session.n_trials, 20);
        assert_eq!(session.scores.len(), 2);
        assert_eq!(session.scores[0].offset, -500.0);
        assert_eq!(session.scores[1], WindowScore { offset: 0.0, accuracy: 1.0 });
    }

    #[test]
    fn test_one_result_per_region() {
        let regions = Some(vec!["HPC".to_string(), "OFC".to_string(), "PFC".to_string()]);
        let report = decode_times(&collection(vec![session_table(20)]), &request(regions)).unwrap();

        let names: Vec<&str> = report.sessions.iter().map(|s| s.region.as_str()).collect();
        assert_eq!(names, vec!["HPC", "OFC"]);
        assert!(report.sessions.iter().all(|s| s.n_neurons == 1));
        assert_eq!(report.sessions[0].scores[1].accuracy, 1.0);
    }

    #[test]
    fn test_sessions_without_enough_trials_are_skipped() {
        let report = decode_times(
            &collection(vec![session_table(3), session_table(20)]),
            &request(None),
        )
        .unwrap();
        assert_eq!(report.sessions.len(), 1);
        assert_eq!(report.sessions[0].date, "20230511");
    }

    #[test]
    fn test_skip_reason() {
        assert!(skip_reason(10, 1, 5).is_some());
        assert!(skip_reason(4, 2, 5).is_some());
        assert!(skip_reason(5, 2, 5).is_none());
    }
}
