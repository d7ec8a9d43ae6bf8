// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Canonical names for raw recording-system fields.

use std::collections::BTreeMap;

use crate::error::SessionResult;
use crate::table::TrialTable;

/// Ordered mapping of raw field name to canonical name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRenames {
    pairs: Vec<(String, String)>,
}

impl FieldRenames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping; an existing raw name keeps its position and takes the new target
    pub fn insert(&mut self, old: impl Into<String>, new: impl Into<String>) {
        let old = old.into();
        let new = new.into();
        match self.pairs.iter_mut().find(|(existing, _)| *existing == old) {
            Some(pair) => pair.1 = new,
            None => self.pairs.push((old, new)),
        }
    }

    /// Merge several tables in order; later tables win for duplicate raw names
    pub fn merged<'a, I>(tables: I) -> Self
    where
        I: IntoIterator<Item = &'a FieldRenames>,
    {
        let mut merged = Self::new();
        for table in tables {
            merged.extend(table.iter().map(|(old, new)| (old.to_string(), new.to_string())));
        }
        merged
    }

    pub fn get(&self, old: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(existing, _)| existing == old)
            .map(|(_, new)| new.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(old, new)| (old.as_str(), new.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for FieldRenames {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (old, new) in iter {
            self.insert(old, new);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldRenames {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut renames = Self::new();
        renames.extend(iter);
        renames
    }
}

impl From<&BTreeMap<String, String>> for FieldRenames {
    fn from(map: &BTreeMap<String, String>) -> Self {
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

const EPOCH_PREFIX: &str = "BehavioralCodes.TrialEpochTimes";

/// Trial epoch boundaries: `<Epoch>.0` is the start, `<Epoch>.1` the end
const EPOCHS: [(&str, &str); 7] = [
    ("AutomaticRotation_1", "pre_rotation"),
    ("CuedNavigation", "nav"),
    ("AutomaticRotation_2", "post_rotation"),
    ("ChoiceLocationApproach", "choice_approach"),
    ("PreChoiceDelay", "pre_choice"),
    ("Choice", "choice"),
    ("ObjectApproach", "approach"),
];

/// Built-in timing renames, e.g. `BehavioralCodes.TrialEpochTimes.Choice.0` -> `choice_start`
pub fn default_timing_renames() -> FieldRenames {
    EPOCHS
        .iter()
        .flat_map(|(epoch, canonical)| {
            [
                (format!("{}.{}.0", EPOCH_PREFIX, epoch), format!("{}_start", canonical)),
                (format!("{}.{}.1", EPOCH_PREFIX, epoch), format!("{}_end", canonical)),
            ]
        })
        .collect()
}

/// Built-in trial-info renames
///
/// The VR engine's Y axis is vertical, so its Z position is the second
/// planar coordinate (`pos_y`) and its Y position becomes `pos_z`.
pub fn default_info_renames() -> FieldRenames {
    [
        ("Float0_IsEast", "IsEast"),
        ("Float1_IsInstructed", "IsInstructed"),
        ("Float2_isTargetRightSide", "target_right"),
        ("Float5_IsTestCondition", "generalization_trial"),
        ("Float8_IsNorth", "IsNorth"),
        ("UserVars.ChoseWhite", "chose_white"),
        ("UserVars.ChoseRight", "chose_right"),
        ("UserVars.RestructuredVRData.Rotation", "rotation_tc"),
        ("UserVars.RestructuredVRData.Position_X", "pos_x"),
        ("UserVars.RestructuredVRData.Position_Y", "pos_z"),
        ("UserVars.RestructuredVRData.Position_Z", "pos_y"),
    ]
    .into_iter()
    .collect()
}

/// Built-in tables, in application order
pub fn default_renames() -> Vec<FieldRenames> {
    vec![default_timing_renames(), default_info_renames()]
}

/// Rename tables from configuration, falling back to the built-ins
pub fn renames_from_config(config: &navpos_config::RenameConfig) -> Vec<FieldRenames> {
    let timing = config
        .timing
        .as_ref()
        .map(FieldRenames::from)
        .unwrap_or_else(default_timing_renames);
    let info = config
        .info
        .as_ref()
        .map(FieldRenames::from)
        .unwrap_or_else(default_info_renames);

    let mut tables = vec![timing, info];
    if !config.extra.is_empty() {
        tables.push(FieldRenames::from(&config.extra));
    }
    tables
}

/// Copy every raw column to its canonical name, leaving the raw column intact
///
/// The tables are merged first, so the last table wins for a duplicate raw name.
///
/// # Errors
///
/// `MissingField` if a raw name is not in the table.
pub fn rename_fields(table: &mut TrialTable, tables: &[FieldRenames]) -> SessionResult<()> {
    let merged = FieldRenames::merged(tables);
    for (old, new) in merged.iter() {
        table.copy_column(old, new)?;
    }
    Ok(())
}
