// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Filter, decode and persist an in-memory session collection.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use ndarray::Array1;
use navpos_decoding::{
    decode_times, format_output_name, write_outputs, DecodeRequest, DecoderKind, RunArgs, ALL_REGIONS,
};
use navpos_session::fields::*;
use navpos_session::filters::mask_uninstructed_trials;
use navpos_session::{mask_completed_trials, Column, SessionCollection, SessionInfo, TrialTable};
use tempfile::TempDir;

/// 40 trials: every 4th is an error, every 5th is instructed.
/// The HPC neuron fires after the event on white-right trials only.
fn session() -> TrialTable {
    let n = 40;
    let labels: Arc<[String]> = vec!["HPC".to_string(), "HPC".to_string(), "OFC".to_string()].into();
    let white: Vec<bool> = (0..n).map(|i| (i / 2) % 2 == 0).collect();
    let spikes = white
        .iter()
        .map(|&w| {
            let informative = if w { vec![5.0, 15.0, 25.0, 35.0] } else { vec![45.0] };
            vec![
                Array1::from(informative),
                Array1::from(vec![-300.0, 200.0]),
                Array1::from(vec![-100.0]),
            ]
        })
        .collect();

    TrialTable::from_columns([
        (TRIAL_ERROR, Column::Number((0..n).map(|i| Some(if i % 4 == 3 { 1.0 } else { 0.0 })).collect())),
        (IS_INSTRUCTED, Column::Number((0..n).map(|i| Some(if i % 5 == 0 { 1.0 } else { 0.0 })).collect())),
        (COMPLETED_TRIAL, Column::Flag((0..n).map(|i| i % 4 != 3).collect())),
        (CORRECT_TRIAL, Column::Flag((0..n).map(|i| i % 4 != 3).collect())),
        (WHITE_RIGHT, Column::Flag(white)),
        (APPROACH_START, Column::Number(vec![Some(0.0); n])),
        (SPIKE_TIMES, Column::Spikes(spikes)),
        (NEURON_REGIONS, Column::Regions(vec![labels; n])),
    ])
    .unwrap()
}

fn collection() -> SessionCollection {
    let mut collection = SessionCollection::default();
    for date in ["20230512", "20230513"] {
        let info = SessionInfo::from_folder(Path::new(&format!("Hashim_{}", date))).unwrap();
        collection.push(&info, session(), 3);
    }
    collection
}

#[test]
fn test_filtered_sessions_decode_and_persist() {
    let data = collection();
    let data_use = data
        .mask_with(|t| mask_completed_trials(t, true))
        .unwrap()
        .mask_with(mask_uninstructed_trials)
        .unwrap();
    assert_eq!(data_use.data[0].n_rows(), 24);

    let request = DecodeRequest {
        target_field: WHITE_RIGHT.to_string(),
        event_field: APPROACH_START.to_string(),
        window_offsets: vec![-500.0, 0.0, 500.0],
        window_width: 50.0,
        folds: 4,
        decoder: DecoderKind::KNearestNeighbors { k: 3 },
        regions: Some(vec!["HPC".to_string()]),
    };
    let report = decode_times(&data_use, &request).unwrap();

    assert_eq!(report.sessions.len(), 2);
    for session in &report.sessions {
        assert_eq!(session.region, "HPC");
        assert_eq!(session.n_neurons, 2);
        assert_eq!(session.n_trials, 24);
        let offsets: Vec<f64> = session.scores.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![-500.0, 0.0, 500.0]);
        assert_eq!(session.scores[1].accuracy, 1.0);
        assert!(session.scores.iter().all(|s| (0.0..=1.0).contains(&s.accuracy)));
    }

    let dir = TempDir::new().unwrap();
    let regions = vec!["HPC".to_string()];
    let name = format_output_name("dec_{region}-{date}_{jobid}", &regions, &data_use.dates, "7");
    assert_eq!(name, "dec_HPC-20230512-20230513_7");

    let args = RunArgs {
        output_folder: dir.path().to_path_buf(),
        output_template: "dec_{region}-{date}_{jobid}".to_string(),
        jobid: "7".to_string(),
        use_inds: None,
        correct_only: true,
        include_instructed: false,
        regions,
        decoder: "neighbors".to_string(),
        date: chrono::Utc::now(),
    };
    let paths = write_outputs(dir.path(), &name, &report, &args).unwrap();

    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&paths.results).unwrap()).unwrap();
    assert_eq!(saved["decoder"], "neighbors(k=3)");
    assert_eq!(saved["sessions"].as_array().unwrap().len(), 2);
    assert_eq!(saved["sessions"][1]["date"], "20230513");
    assert!(paths.args.exists());
}

#[test]
fn test_single_class_sessions_are_skipped() {
    let mut data = SessionCollection::default();
    let info = SessionInfo::from_folder(Path::new("Gulli_20230512")).unwrap();
    let mut table = session();
    table.insert(WHITE_RIGHT, Column::Flag(vec![true; 40])).unwrap();
    data.push(&info, table, 3);

    let request = DecodeRequest {
        target_field: WHITE_RIGHT.to_string(),
        event_field: APPROACH_START.to_string(),
        window_offsets: vec![0.0],
        window_width: 50.0,
        folds: 5,
        decoder: DecoderKind::NearestCentroid,
        regions: None,
    };
    let report = decode_times(&data, &request).unwrap();
    assert!(report.sessions.is_empty());
    assert_eq!(ALL_REGIONS, "all");
}

#[test]
fn test_short_spike_row_does_not_abort_decoding() {
    let mut table = session();
    let mut spikes = table.spikes(SPIKE_TIMES).unwrap().to_vec();
    // Trial 6 lost its OFC neuron
    spikes[6].truncate(2);
    table.insert(SPIKE_TIMES, Column::Spikes(spikes)).unwrap();

    let mut data = SessionCollection::default();
    let info = SessionInfo::from_folder(Path::new("Hashim_20230512")).unwrap();
    data.push(&info, table, 3);

    let request = DecodeRequest {
        target_field: WHITE_RIGHT.to_string(),
        event_field: APPROACH_START.to_string(),
        window_offsets: vec![0.0],
        window_width: 50.0,
        folds: 4,
        decoder: DecoderKind::NearestCentroid,
        regions: None,
    };
    let report = decode_times(&data, &request).unwrap();

    assert_eq!(report.sessions.len(), 1);
    assert_eq!(report.sessions[0].n_trials, 40);
    assert_eq!(report.sessions[0].n_neurons, 3);
}
