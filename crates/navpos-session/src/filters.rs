// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Post-hoc trial selection.

use crate::error::{SessionError, SessionResult};
use crate::fields::{COMPLETED_TRIAL, CORRECT_TRIAL, IS_INSTRUCTED};
use crate::table::{Column, TrialTable};

/// Per-row truth of a flag column, or of a number column (present and non-zero)
fn truth_values(table: &TrialTable, field: &str) -> SessionResult<Vec<bool>> {
    match table.column(field)? {
        Column::Flag(values) => Ok(values.clone()),
        Column::Number(values) => Ok(values
            .iter()
            .map(|v| v.is_some_and(|v| v != 0.0 && !v.is_nan()))
            .collect()),
        other => Err(SessionError::ColumnType {
            field: field.to_string(),
            expected: "flag",
            found: other.type_name(),
        }),
    }
}

/// Completed trials, optionally only the correct ones
pub fn mask_completed_trials(table: &TrialTable, correct_only: bool) -> SessionResult<TrialTable> {
    mask_completed_trials_by(table, correct_only, COMPLETED_TRIAL, CORRECT_TRIAL)
}

pub fn mask_completed_trials_by(
    table: &TrialTable,
    correct_only: bool,
    completed_field: &str,
    correct_field: &str,
) -> SessionResult<TrialTable> {
    let mut mask = truth_values(table, completed_field)?;
    if correct_only {
        let correct = truth_values(table, correct_field)?;
        for (keep, correct) in mask.iter_mut().zip(correct) {
            *keep &= correct;
        }
    }
    table.filter(&mask)
}

/// Trials where the instructed flag is exactly 0
pub fn mask_uninstructed_trials(table: &TrialTable) -> SessionResult<TrialTable> {
    mask_uninstructed_trials_by(table, IS_INSTRUCTED)
}

pub fn mask_uninstructed_trials_by(table: &TrialTable, instructed_field: &str) -> SessionResult<TrialTable> {
    let mask: Vec<bool> = match table.column(instructed_field)? {
        Column::Number(values) => values.iter().map(|v| *v == Some(0.0)).collect(),
        Column::Flag(values) => values.iter().map(|v| !v).collect(),
        other => {
            return Err(SessionError::ColumnType {
                field: instructed_field.to_string(),
                expected: "number",
                found: other.type_name(),
            })
        }
    };
    table.filter(&mask)
}
