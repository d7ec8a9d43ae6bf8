// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Border-crossing detection on 1-D position traces.
//!
//! A trace is compared against a border. Samples closer than `threshold` to
//! the border form near-border runs (connected components of the near-border
//! mask). A run counts as a crossing only when the signal has opposite signs
//! at its first and last sample; a run that merely touches the border (sign
//! product of zero) or returns to the side it came from is ignored.

use std::ops::Range;

use navpos_config::CrossingsConfig;

/// Border position and near-border distance, in trace units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossingParams {
    pub border: f64,
    pub threshold: f64,
}

impl Default for CrossingParams {
    fn default() -> Self {
        Self {
            border: 500.0,
            threshold: 2.0,
        }
    }
}

impl From<&CrossingsConfig> for CrossingParams {
    fn from(config: &CrossingsConfig) -> Self {
        Self {
            border: config.border,
            threshold: config.threshold,
        }
    }
}

/// One crossing: time index of closest approach and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub time: usize,
    /// True when the trace goes from below the border to above it
    pub upward: bool,
}

/// All crossings of one trial, in time order, as parallel lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrialCrossings {
    pub times: Vec<usize>,
    pub upward: Vec<bool>,
}

impl TrialCrossings {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Crossing> + '_ {
        self.times
            .iter()
            .zip(&self.upward)
            .map(|(&time, &upward)| Crossing { time, upward })
    }
}

impl FromIterator<Crossing> for TrialCrossings {
    fn from_iter<T: IntoIterator<Item = Crossing>>(iter: T) -> Self {
        let mut crossings = TrialCrossings::default();
        for crossing in iter {
            crossings.times.push(crossing.time);
            crossings.upward.push(crossing.upward);
        }
        crossings
    }
}

/// Maximal runs of consecutive `true` values, in order
pub fn true_runs(mask: &[bool]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, &value) in mask.iter().enumerate() {
        match (value, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..mask.len());
    }
    runs
}

/// Sign as -1, 0 or 1
fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Crossings of a single trace
pub fn find_trial_crossings(trace: &[f64], params: &CrossingParams) -> TrialCrossings {
    let signal: Vec<f64> = trace.iter().map(|p| p - params.border).collect();
    // NaN never compares below the threshold
    let near_border: Vec<bool> = signal.iter().map(|s| s.abs() < params.threshold).collect();

    true_runs(&near_border)
        .into_iter()
        .filter_map(|run| {
            let event = &signal[run.clone()];
            let s_pre = sign(event[0]);
            let s_post = sign(event[event.len() - 1]);
            if s_pre * s_post >= 0 {
                return None;
            }

            let closest = event
                .iter()
                .enumerate()
                .fold((0, f64::INFINITY), |(best_i, best), (i, s)| {
                    if s.abs() < best {
                        (i, s.abs())
                    } else {
                        (best_i, best)
                    }
                })
                .0;

            Some(Crossing {
                time: run.start + closest,
                upward: s_pre < s_post,
            })
        })
        .collect()
}

/// Crossings of every trial's trace
pub fn find_crossings<T: AsRef<[f64]>>(traces: &[T], params: &CrossingParams) -> Vec<TrialCrossings> {
    traces
        .iter()
        .map(|trace| find_trial_crossings(trace.as_ref(), params))
        .collect()
}

/// Latest crossing strictly before `cutoff`
///
/// Missing cutoff or no qualifying crossing gives `None`.
pub fn relevant_crossing(times: &[usize], cutoff: Option<f64>) -> Option<f64> {
    let cutoff = cutoff?;
    times
        .iter()
        .map(|&t| t as f64)
        .filter(|&t| t < cutoff)
        .fold(None, |latest: Option<f64>, t| {
            Some(latest.map_or(t, |l| l.max(t)))
        })
}

/// [`relevant_crossing`] for every trial
pub fn relevant_crossings<T: AsRef<[usize]>>(crossings: &[T], cutoffs: &[Option<f64>]) -> Vec<Option<f64>> {
    crossings
        .iter()
        .zip(cutoffs)
        .map(|(times, &cutoff)| relevant_crossing(times.as_ref(), cutoff))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_true_runs() {
        assert_eq!(
            true_runs(&[true, true, false, true, false, false, true]),
            vec![0..2, 3..4, 6..7]
        );
        assert!(true_runs(&[false, false]).is_empty());
        assert!(true_runs(&[]).is_empty());
    }

    #[test]
    fn test_upward_crossing_at_closest_approach() {
        let trace = [498.0, 499.0, 500.0, 501.0, 502.0];
        let found = find_trial_crossings(&trace, &CrossingParams::default());
        assert_eq!(found.times, vec![2]);
        assert_eq!(found.upward, vec![true]);
    }

    #[test]
    fn test_downward_crossing() {
        let trace = [510.0, 501.5, 500.4, 498.8, 490.0];
        let found = find_trial_crossings(&trace, &CrossingParams::default());
        assert_eq!(found.iter().collect::<Vec<_>>(), vec![Crossing { time: 2, upward: false }]);
    }

    #[test]
    fn test_touch_is_not_a_crossing() {
        // Run is [499, 500]: signs -1 and 0, product 0
        let trace = [490.0, 499.0, 500.0, 490.0];
        assert!(find_trial_crossings(&trace, &CrossingParams::default()).is_empty());

        // Run starts exactly on the border
        let trace = [500.0, 501.0, 510.0];
        assert!(find_trial_crossings(&trace, &CrossingParams::default()).is_empty());
    }

    #[test]
    fn test_return_to_same_side_is_not_a_crossing() {
        let trace = [490.0, 499.0, 501.0, 499.5, 490.0];
        assert!(find_trial_crossings(&trace, &CrossingParams::default()).is_empty());
    }

    #[test]
    fn test_multiple_crossings_in_time_order() {
        let trace = [
            490.0, 499.0, 501.0, 510.0, // up at 1 or 2 (tie -> first)
            510.0, 501.0, 499.5, 490.0, // down at 6
        ];
        let found = find_trial_crossings(&trace, &CrossingParams::default());
        assert_eq!(found.times, vec![1, 6]);
        assert_eq!(found.upward, vec![true, false]);
    }

    #[test]
    fn test_nan_breaks_runs() {
        let trace = [499.0, f64::NAN, 501.0];
        assert!(find_trial_crossings(&trace, &CrossingParams::default()).is_empty());
    }

    #[test]
    fn test_custom_params() {
        let params = CrossingParams { border: 0.0, threshold: 0.5 };
        let traces = vec![vec![-0.2, 0.1], vec![], vec![-3.0, 3.0]];
        let found = find_crossings(&traces, &params);
        assert_eq!(found[0].times, vec![1]);
        assert!(found[1].is_empty());
        // Jumps over the border without any near-border sample
        assert!(found[2].is_empty());
    }

    #[test]
    fn test_relevant_crossing() {
        assert_eq!(relevant_crossing(&[3, 10, 20], Some(15.0)), Some(10.0));
        assert_eq!(relevant_crossing(&[3, 10, 20], Some(10.0)), Some(3.0));
        assert_eq!(relevant_crossing(&[3, 10], Some(3.0)), None);
        assert_eq!(relevant_crossing(&[], Some(100.0)), None);
        assert_eq!(relevant_crossing(&[3], None), None);
        // Unordered input still picks the latest qualifying crossing
        assert_eq!(relevant_crossing(&[12, 4, 9], Some(11.0)), Some(9.0));
    }

    #[test]
    fn test_relevant_crossing_is_before_cutoff() {
        let crossings = vec![vec![1, 5, 9], vec![2], vec![7, 8]];
        let cutoffs = vec![Some(6.0), Some(2.0), Some(100.0)];
        let relevant = relevant_crossings(&crossings, &cutoffs);
        assert_eq!(relevant, vec![Some(5.0), None, Some(8.0)]);
        for (rel, cutoff) in relevant.iter().zip(&cutoffs) {
            if let (Some(r), Some(c)) = (rel, cutoff) {
                assert!(r < c);
            }
        }
    }
}
