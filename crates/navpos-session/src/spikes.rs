// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Spike-time organization and neuron metadata.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::table::TrialSpikes;

/// Raw spike times of one neuron in one trial
///
/// Exporters write a lone spike as a bare number and a silent neuron as
/// `null` or `[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpikeEntry {
    Many(Vec<f64>),
    One(f64),
    Empty,
}

impl SpikeEntry {
    pub fn to_array(&self) -> Array1<f64> {
        match self {
            SpikeEntry::Many(times) => Array1::from_vec(times.clone()),
            SpikeEntry::One(time) => Array1::from_vec(vec![*time]),
            SpikeEntry::Empty => Array1::zeros(0),
        }
    }
}

/// Raw spike table, indexed `[trial][neuron]`
pub type RawSpikes = Vec<Vec<SpikeEntry>>;

/// One row of the good-neuron table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronInfo {
    pub region: String,
    /// Any other per-neuron columns
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl NeuronInfo {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            extra: BTreeMap::new(),
        }
    }
}

/// Spike arrays and region labels, one entry per trial
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizedSpikes {
    /// The same label allocation repeated for every trial
    pub regions: Vec<Arc<[String]>>,
    pub spike_times: Vec<TrialSpikes>,
}

impl OrganizedSpikes {
    pub fn n_trials(&self) -> usize {
        self.spike_times.len()
    }

    /// Keep only the first `n_trials` trials
    pub fn truncate(&mut self, n_trials: usize) {
        self.regions.truncate(n_trials);
        self.spike_times.truncate(n_trials);
    }
}

/// Convert raw per-trial spike rows into arrays and replicate region labels
pub fn organize_spikes(spikes: &[Vec<SpikeEntry>], neurons: &[NeuronInfo]) -> OrganizedSpikes {
    let labels: Arc<[String]> = neurons.iter().map(|n| n.region.clone()).collect();

    let spike_times: Vec<TrialSpikes> = spikes
        .iter()
        .enumerate()
        .map(|(trial, row)| {
            if row.len() != neurons.len() {
                tracing::warn!(
                    trial,
                    neurons_in_row = row.len(),
                    neurons_in_table = neurons.len(),
                    "spike row width differs from good-neuron table"
                );
            }
            row.iter().map(SpikeEntry::to_array).collect()
        })
        .collect();

    OrganizedSpikes {
        regions: vec![labels; spike_times.len()],
        spike_times,
    }
}
