// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Sampling per-trial time series at per-trial timestamps.

use crate::error::{SessionError, SessionResult};
use crate::table::TrialTable;

/// Value of `series` at `timestamp`, truncated to a whole index
///
/// A missing timestamp or a NaN sample gives `None`.
///
/// # Errors
///
/// `InvalidTimeIndex` for a negative or infinite timestamp,
/// `TimeIndexOutOfRange` for an index past the end of the series.
pub fn sample_at(trial: usize, timestamp: Option<f64>, series: &[f64]) -> SessionResult<Option<f64>> {
    let Some(t) = timestamp.filter(|t| !t.is_nan()) else {
        return Ok(None);
    };
    if !t.is_finite() || t <= -1.0 {
        return Err(SessionError::InvalidTimeIndex { trial, value: t });
    }

    let index = t.trunc() as usize;
    let value = series
        .get(index)
        .ok_or(SessionError::TimeIndexOutOfRange {
            trial,
            index,
            len: series.len(),
        })?;
    Ok(Some(*value).filter(|v| !v.is_nan()))
}

/// Sample the `extract_field` series of every trial at its `t_field` timestamp
///
/// # Errors
///
/// Missing or mistyped columns, plus the errors of [`sample_at`].
pub fn extract_time_field(
    table: &TrialTable,
    t_field: &str,
    extract_field: &str,
) -> SessionResult<Vec<Option<f64>>> {
    let times = table.numbers(t_field)?;
    let series = table.series(extract_field)?;

    times
        .iter()
        .zip(series)
        .enumerate()
        .map(|(trial, (&t, values))| sample_at(trial, t, values))
        .collect()
}
