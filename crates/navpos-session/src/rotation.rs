// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Heading discretization into cardinal directions.

use navpos_config::RotationConfig;

/// Bin centers on a circle of circumference `period`
#[derive(Debug, Clone, PartialEq)]
pub struct RotationBins {
    pub centers: Vec<f64>,
    /// Nominal bin width; assignment is always to the nearest center
    pub width: f64,
    pub period: f64,
}

impl Default for RotationBins {
    fn default() -> Self {
        Self {
            centers: vec![0.0, 90.0, 180.0, 270.0],
            width: 90.0,
            period: 360.0,
        }
    }
}

impl From<&RotationConfig> for RotationBins {
    fn from(config: &RotationConfig) -> Self {
        Self {
            centers: config.centers.clone(),
            width: config.width,
            period: config.period,
        }
    }
}

/// Wrap `delta` into `[-period / 2, period / 2)`
pub fn normalize_periodic(delta: f64, period: f64) -> f64 {
    let half = period / 2.0;
    (delta + half).rem_euclid(period) - half
}

impl RotationBins {
    /// Index of the center nearest to `angle` under wraparound distance
    ///
    /// Ties go to the earlier center. `None` only when there are no centers.
    pub fn nearest(&self, angle: f64) -> Option<usize> {
        self.centers
            .iter()
            .map(|c| normalize_periodic(angle - c, self.period).abs())
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((i, d)),
            })
            .map(|(i, _)| i)
    }
}

/// Bin every rotation; missing rotations stay missing
pub fn discretize_rotation(rotations: &[Option<f64>], bins: &RotationBins) -> Vec<Option<usize>> {
    rotations
        .iter()
        .map(|r| r.filter(|r| !r.is_nan()).and_then(|r| bins.nearest(r)))
        .collect()
}
