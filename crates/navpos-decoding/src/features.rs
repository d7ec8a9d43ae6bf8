// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Spike-count features and class labels from an enriched trial table.

use std::collections::BTreeSet;

use ndarray::{Array1, Array2};
use navpos_session::fields::{NEURON_REGIONS, SPIKE_TIMES};
use navpos_session::{Column, TrialTable};

use crate::error::{DecodingError, DecodingResult};

/// Half-open counting window `[start, end)` relative to an event time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub start: f64,
    pub end: f64,
}

impl Window {
    pub fn new(offset: f64, width: f64) -> Self {
        Self {
            start: offset,
            end: offset + width,
        }
    }

    pub fn contains(&self, relative_time: f64) -> bool {
        relative_time >= self.start && relative_time < self.end
    }
}

/// Neurons whose region label is one of `regions`; every neuron when `regions` is `None`
pub fn neuron_mask(labels: &[String], regions: Option<&[String]>) -> Vec<bool> {
    labels
        .iter()
        .map(|label| regions.map_or(true, |wanted| wanted.contains(label)))
        .collect()
}

/// Spike counts of the selected neurons in `window` around each trial's event
///
/// Trials without an event time give `None`. Every row has one entry per
/// selected neuron of the region table, whatever the width of the spike row.
pub fn spike_counts(
    table: &TrialTable,
    event_field: &str,
    window: Window,
    regions: Option<&[String]>,
) -> DecodingResult<Vec<Option<Array1<f64>>>> {
    let events = table.numbers(event_field)?;
    let spikes = table.spikes(SPIKE_TIMES)?;
    let labels = table.regions(NEURON_REGIONS)?;

    let counts = events
        .iter()
        .zip(spikes)
        .zip(labels)
        .map(|((event, trial), labels)| {
            let event = (*event)?;
            let mask = neuron_mask(labels, regions);
            // Neurons missing from a short spike row count zero
            let counts = mask
                .iter()
                .enumerate()
                .filter(|(_, keep)| **keep)
                .map(|(neuron, _)| {
                    trial
                        .get(neuron)
                        .map_or(0, |times| times.iter().filter(|t| window.contains(**t - event)).count())
                        as f64
                })
                .collect::<Array1<f64>>();
            Some(counts)
        })
        .collect();
    Ok(counts)
}

/// Integer class label per trial
///
/// Flags map to 0/1, categories to their bin index, numbers must be integral.
/// Missing values give `None`.
pub fn class_labels(table: &TrialTable, target_field: &str) -> DecodingResult<Vec<Option<i64>>> {
    let unsupported = |reason: &str| DecodingError::UnsupportedTarget {
        field: target_field.to_string(),
        reason: reason.to_string(),
    };

    match table.column(target_field)? {
        Column::Flag(values) => Ok(values.iter().map(|&v| Some(i64::from(v))).collect()),
        Column::Category(values) => Ok(values.iter().map(|v| v.map(|c| c as i64)).collect()),
        Column::Number(values) => values
            .iter()
            .map(|v| match v {
                None => Ok(None),
                Some(x) if x.is_finite() && x.fract() == 0.0 => Ok(Some(*x as i64)),
                Some(_) => Err(unsupported("non-integer value")),
            })
            .collect(),
        other => Err(unsupported(&format!("{} columns are not labels", other.type_name()))),
    }
}

/// Trials usable for decoding: event and label both present
pub fn usable_trials(labels: &[Option<i64>], events: &[Option<f64>]) -> Vec<usize> {
    labels
        .iter()
        .zip(events)
        .enumerate()
        .filter(|(_, (label, event))| label.is_some() && event.is_some())
        .map(|(trial, _)| trial)
        .collect()
}

/// Feature matrix and labels of the usable trials
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// trials x neurons
    pub x: Array2<f64>,
    pub y: Vec<i64>,
    /// Row index into the source table for every row of `x`
    pub trials: Vec<usize>,
}

impl Dataset {
    pub fn n_trials(&self) -> usize {
        self.y.len()
    }

    pub fn n_classes(&self) -> usize {
        self.y.iter().collect::<BTreeSet<_>>().len()
    }
}

/// [`spike_counts`] paired with [`class_labels`], skipping trials missing either
pub fn labeled_counts(
    table: &TrialTable,
    target_field: &str,
    event_field: &str,
    window: Window,
    regions: Option<&[String]>,
) -> DecodingResult<Dataset> {
    let labels = class_labels(table, target_field)?;
    let counts = spike_counts(table, event_field, window, regions)?;

    let mut trials = Vec::new();
    let mut y = Vec::new();
    let mut rows = Vec::new();
    for (trial, (label, row)) in labels.into_iter().zip(counts).enumerate() {
        if let (Some(label), Some(row)) = (label, row) {
            trials.push(trial);
            y.push(label);
            rows.push(row);
        }
    }

    let width = rows.first().map_or(0, |r| r.len());
    let mut x = Array2::zeros((rows.len(), width));
    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(DecodingError::RaggedFeatures {
                trial: trials[i],
                expected: width,
                actual: row.len(),
            });
        }
        x.row_mut(i).assign(row);
    }

    Ok(Dataset { x, y, trials })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::sync::Arc;

    fn table() -> TrialTable {
        let labels: Arc<[String]> = vec!["HPC".to_string(), "OFC".to_string()].into();
        TrialTable::from_columns([
            ("approach_start", Column::Number(vec![Some(100.0), None, Some(50.0)])),
            ("white_right", Column::Flag(vec![true, false, false])),
            (
                SPIKE_TIMES,
                Column::Spikes(vec![
                    vec![array![90.0, 100.0, 120.0, 150.0], array![99.0]],
                    vec![array![1.0], array![2.0]],
                    vec![Array1::from(vec![]), array![50.0, 51.0, 60.0]],
                ]),
            ),
            (NEURON_REGIONS, Column::Regions(vec![labels; 3])),
        ])
        .unwrap()
    }

    #[test]
    fn test_window_is_half_open() {
        let window = Window::new(0.0, 50.0);
        assert!(window.contains(0.0));
        assert!(window.contains(49.9));
        assert!(!window.contains(50.0));
        assert!(!window.contains(-0.1));
    }

    #[test]
    fn test_spike_counts_per_region() {
        let all = spike_counts(&table(), "approach_start", Window::new(0.0, 50.0), None).unwrap();
        assert_eq!(all[0], Some(array![2.0, 0.0]));
        assert_eq!(all[1], None);
        assert_eq!(all[2], Some(array![0.0, 3.0]));

        let ofc = ["OFC".to_string()];
        let only_ofc = spike_counts(&table(), "approach_start", Window::new(-5.0, 10.0), Some(&ofc)).unwrap();
        assert_eq!(only_ofc[0], Some(array![1.0]));
    }

    #[test]
    fn test_class_labels() {
        let table = TrialTable::from_columns([
            ("flag", Column::Flag(vec![true, false])),
            ("bin", Column::Category(vec![Some(3), None])),
            ("code", Column::Number(vec![Some(6.0), None])),
            ("frac", Column::Number(vec![Some(0.5), None])),
            ("text", Column::Text(vec!["a".into(), "b".into()])),
        ])
        .unwrap();

        assert_eq!(class_labels(&table, "flag").unwrap(), vec![Some(1), Some(0)]);
        assert_eq!(class_labels(&table, "bin").unwrap(), vec![Some(3), None]);
        assert_eq!(class_labels(&table, "code").unwrap(), vec![Some(6), None]);
        assert!(matches!(
            class_labels(&table, "frac"),
            Err(DecodingError::UnsupportedTarget { .. })
        ));
        assert!(matches!(
            class_labels(&table, "text"),
            Err(DecodingError::UnsupportedTarget { .. })
        ));
    }

    #[test]
    fn test_short_spike_row_counts_missing_neurons_as_zero() {
        let labels: Arc<[String]> = vec!["HPC".to_string(), "OFC".to_string()].into();
        let table = TrialTable::from_columns([
            ("approach_start", Column::Number(vec![Some(0.0), Some(0.0)])),
            ("white_right", Column::Flag(vec![true, false])),
            (
                SPIKE_TIMES,
                Column::Spikes(vec![vec![array![1.0], array![2.0, 3.0]], vec![array![4.0]]]),
            ),
            (NEURON_REGIONS, Column::Regions(vec![labels; 2])),
        ])
        .unwrap();

        let data = labeled_counts(&table, "white_right", "approach_start", Window::new(0.0, 10.0), None).unwrap();
        assert_eq!(data.x, array![[1.0, 2.0], [1.0, 0.0]]);

        let ofc = ["OFC".to_string()];
        let only_ofc = spike_counts(&table, "approach_start", Window::new(0.0, 10.0), Some(&ofc)).unwrap();
        assert_eq!(only_ofc[1], Some(array![0.0]));
    }

    #[test]
    fn test_labeled_counts_skip_missing_events() {
        let data = labeled_counts(&table(), "white_right", "approach_start", Window::new(0.0, 50.0), None).unwrap();
        assert_eq!(data.trials, vec![0, 2]);
        assert_eq!(data.y, vec![1, 0]);
        assert_eq!(data.x, array![[2.0, 0.0], [0.0, 3.0]]);
        assert_eq!(data.n_classes(), 2);
    }
}
