// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Configuration file -> session folders -> enriched tables -> decoding -> JSON.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use navpos::config::{load_config, validate_config};
use navpos::decoding::{decode_times, format_output_name, write_outputs, DecodeRequest, DecoderKind, RunArgs};
use navpos::prelude::*;
use navpos::session::fields::*;
use serde_json::{json, Map, Value};
use tempfile::TempDir;

const SERIES_LEN: usize = 30;
const N_TRIALS: usize = 24;

fn epoch_columns(frame: &mut Map<String, Value>) {
    let epochs = [
        "AutomaticRotation_1",
        "CuedNavigation",
        "AutomaticRotation_2",
        "ChoiceLocationApproach",
        "PreChoiceDelay",
        "Choice",
        "ObjectApproach",
    ];
    for (e, epoch) in epochs.iter().enumerate() {
        for bound in 0..2 {
            let value = match (*epoch, bound) {
                ("AutomaticRotation_2", 1) => json!(4.0),
                ("ObjectApproach", 0) => json!(10.0),
                _ => json!(e as f64),
            };
            frame.insert(
                format!("BehavioralCodes.TrialEpochTimes.{}.{}", epoch, bound),
                Value::Array(vec![value; N_TRIALS]),
            );
        }
    }
}

fn per_trial(frame: &mut Map<String, Value>, name: &str, f: impl Fn(usize) -> Value) {
    frame.insert(name.to_string(), Value::Array((0..N_TRIALS).map(f).collect()));
}

fn write_session(base: &Path, subject: &str, date: &str) {
    let folder = base.join(format!("{}_{}", subject, date));
    fs::create_dir_all(&folder).unwrap();

    let mut frame = Map::new();
    epoch_columns(&mut frame);
    per_trial(&mut frame, "TrialError", |i| json!(if i % 6 == 5 { 1.0 } else { 0.0 }));
    per_trial(&mut frame, "Float0_IsEast", |i| json!((i % 2) as f64));
    per_trial(&mut frame, "Float1_IsInstructed", |_| json!(0.0));
    per_trial(&mut frame, "Float2_isTargetRightSide", |i| json!(((i / 2) % 2) as f64));
    per_trial(&mut frame, "Float5_IsTestCondition", |_| json!(0.0));
    per_trial(&mut frame, "Float8_IsNorth", |_| json!(1.0));
    per_trial(&mut frame, "UserVars.ChoseWhite", |_| json!(1.0));
    per_trial(&mut frame, "UserVars.ChoseRight", |_| json!(1.0));
    per_trial(&mut frame, "UserVars.RestructuredVRData.Rotation", |i| {
        let heading = if i % 2 == 0 { 92.0 } else { 268.0 };
        json!(vec![heading; SERIES_LEN])
    });
    per_trial(&mut frame, "UserVars.RestructuredVRData.Position_X", |_| {
        // Upward crossing at index 5, downward at index 20
        let trace: Vec<f64> = (0..SERIES_LEN)
            .map(|t| match t {
                5 => 499.5,
                6 => 500.5,
                20 => 500.5,
                21 => 499.5,
                t if (6..20).contains(&t) => 520.0,
                _ => 480.0,
            })
            .collect();
        json!(trace)
    });
    per_trial(&mut frame, "UserVars.RestructuredVRData.Position_Y", |_| json!(vec![1.0; SERIES_LEN]));
    per_trial(&mut frame, "UserVars.RestructuredVRData.Position_Z", |_| json!(vec![250.0; SERIES_LEN]));

    let behavior = json!({ "data_frame": frame });
    fs::write(
        folder.join(format!("{}_{}_VR_behave.json", date, subject.to_lowercase())),
        behavior.to_string(),
    )
    .unwrap();

    // white_right = (IsEast == target_right); the HPC neuron fires after approach on those trials
    let spikes: Vec<Value> = (0..N_TRIALS)
        .map(|i| {
            let white = (i % 2) == ((i / 2) % 2);
            let hpc = if white { json!([11.0, 12.0, 13.0]) } else { json!([]) };
            json!([hpc, [2.0], 25.0])
        })
        .collect();
    fs::write(folder.join("spike_times.json"), Value::Array(spikes).to_string()).unwrap();

    let neurons = json!([{"region": "HPC"}, {"region": "OFC"}, {"region": "OFC"}]);
    fs::write(folder.join("good_neurons.json"), neurons.to_string()).unwrap();
}

fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("navpos_configuration.toml");
    fs::write(
        &path,
        r#"
[crossings]
border = 500.0
threshold = 2.0

[decoding]
window_offsets = [-10.0, 0.0]
window_width = 5.0
folds = 4

[output]
template = "dec_{region}-{date}_{jobid}"
jobid = "e2e"
"#,
    )
    .unwrap();
    path
}

#[test]
fn test_folder_to_decoding_results() {
    let data_dir = TempDir::new().unwrap();
    write_session(data_dir.path(), "Gulli", "20230512");
    write_session(data_dir.path(), "Hashim", "20230601");

    let out_dir = TempDir::new().unwrap();
    let config_path = write_config(out_dir.path());
    let overrides: HashMap<String, String> = [
        ("base_folder".to_string(), data_dir.path().display().to_string()),
        ("output_folder".to_string(), out_dir.path().join("results").display().to_string()),
    ]
    .into_iter()
    .collect();

    let config = load_config(Some(config_path.as_path()), Some(&overrides)).unwrap();
    validate_config(&config).unwrap();
    assert_eq!(config.decoding.folds, 4);

    let source = FolderSource::from_config(&config.data);
    let sessions = load_data_folder(&source, &LoadOptions::from_config(&config)).unwrap();
    assert_eq!(sessions.subjects, vec!["Gulli", "Hashim"]);

    let table = &sessions.data[0];
    assert_eq!(table.n_rows(), N_TRIALS);
    assert_eq!(table.numbers(PRE_CHOICE_ROTATION).unwrap()[0], Some(92.0));
    assert_eq!(table.categories(CHOICE_ROTATION).unwrap()[..2].to_vec(), vec![Some(1), Some(3)]);
    assert_eq!(table.events(BORDER_CROSSING_X).unwrap()[0], vec![5, 20]);
    assert_eq!(table.numbers(RELEVANT_CROSSING_X).unwrap()[0], Some(5.0));
    assert_eq!(table.numbers(RELEVANT_CROSSING_Y).unwrap()[0], None);

    let data_use = sessions
        .mask_with(|t| mask_completed_trials(t, false))
        .unwrap()
        .mask_with(mask_uninstructed_trials)
        .unwrap();
    assert_eq!(data_use.data[0].n_rows(), 20);

    let request = DecodeRequest::from_config(&config.decoding, DecoderKind::NearestCentroid, None);
    let report = decode_times(&data_use, &request).unwrap();
    assert_eq!(report.sessions.len(), 2);
    for session in &report.sessions {
        assert_eq!(session.n_neurons, 3);
        assert_eq!(session.scores[1].offset, 0.0);
        assert_eq!(session.scores[1].accuracy, 1.0);
    }

    let regions = vec!["all".to_string()];
    let name = format_output_name(&config.output.template, &regions, &data_use.dates, &config.output.jobid);
    assert_eq!(name, "dec_all-20230512-20230601_e2e");

    let args = RunArgs {
        output_folder: config.output.folder.clone(),
        output_template: config.output.template.clone(),
        jobid: config.output.jobid.clone(),
        use_inds: None,
        correct_only: false,
        include_instructed: false,
        regions,
        decoder: "linear".to_string(),
        date: chrono::Utc::now(),
    };
    let paths = write_outputs(&config.output.folder, &name, &report, &args).unwrap();
    assert!(paths.results.starts_with(out_dir.path().join("results")));
    assert!(paths.results.exists());
    assert!(paths.args.exists());
}

#[test]
fn test_cli_overrides_select_sessions() {
    let data_dir = TempDir::new().unwrap();
    write_session(data_dir.path(), "Gulli", "20230512");
    write_session(data_dir.path(), "Gulli", "20230513");
    write_session(data_dir.path(), "Hashim", "20230601");

    let config_path = write_config(data_dir.path());
    let overrides: HashMap<String, String> = [
        ("base_folder".to_string(), data_dir.path().display().to_string()),
        ("max_files".to_string(), "2".to_string()),
    ]
    .into_iter()
    .collect();
    let config = load_config(Some(config_path.as_path()), Some(&overrides)).unwrap();
    assert_eq!(config.data.max_files, Some(2));

    let source = FolderSource::from_config(&config.data);
    let sessions = load_data_folder(&source, &LoadOptions::from_config(&config)).unwrap();
    assert_eq!(sessions.dates, vec!["20230512", "20230513"]);
}
