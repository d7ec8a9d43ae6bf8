// Copyright 2025 Navigation Position Lab
// SPDX-License-Identifier: Apache-2.0

//! Columnar trial table.
//!
//! One row per trial, one typed [`Column`] per field. Array-valued fields are
//! ragged: every trial owns its own series, and every neuron within a trial
//! owns its own spike array. Missing scalars are `None`, never NaN.

use ahash::AHashMap;
use ndarray::Array1;
use std::sync::Arc;

use crate::error::{SessionError, SessionResult};

/// Spike times of every neuron in one trial, neuron order fixed per session
pub type TrialSpikes = Vec<Array1<f64>>;

/// A typed column of a [`TrialTable`]
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Nullable scalars: outcome codes, design flags, epoch timestamps
    Number(Vec<Option<f64>>),
    /// Derived booleans
    Flag(Vec<bool>),
    /// Bin indices
    Category(Vec<Option<usize>>),
    /// Per-trial time series; NaN marks a missing sample
    Series(Vec<Vec<f64>>),
    Spikes(Vec<TrialSpikes>),
    /// Region labels, one shared allocation per session
    Regions(Vec<Arc<[String]>>),
    /// Per-trial event times (time indices)
    Events(Vec<Vec<usize>>),
    /// Per-trial event directions, parallel to an `Events` column
    Directions(Vec<Vec<bool>>),
    Text(Vec<String>),
}

macro_rules! each_variant {
    ($column:expr, $values:ident => $body:expr) => {
        match $column {
            Column::Number($values) => $body,
            Column::Flag($values) => $body,
            Column::Category($values) => $body,
            Column::Series($values) => $body,
            Column::Spikes($values) => $body,
            Column::Regions($values) => $body,
            Column::Events($values) => $body,
            Column::Directions($values) => $body,
            Column::Text($values) => $body,
        }
    };
}

macro_rules! map_variant {
    ($column:expr, $values:ident => $body:expr) => {
        match $column {
            Column::Number($values) => Column::Number($body),
            Column::Flag($values) => Column::Flag($body),
            Column::Category($values) => Column::Category($body),
            Column::Series($values) => Column::Series($body),
            Column::Spikes($values) => Column::Spikes($body),
            Column::Regions($values) => Column::Regions($body),
            Column::Events($values) => Column::Events($body),
            Column::Directions($values) => Column::Directions($body),
            Column::Text($values) => Column::Text($body),
        }
    };
}

impl Column {
    pub fn len(&self) -> usize {
        each_variant!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Column::Number(_) => "number",
            Column::Flag(_) => "flag",
            Column::Category(_) => "category",
            Column::Series(_) => "series",
            Column::Spikes(_) => "spikes",
            Column::Regions(_) => "regions",
            Column::Events(_) => "events",
            Column::Directions(_) => "directions",
            Column::Text(_) => "text",
        }
    }

    fn truncate(&mut self, len: usize) {
        each_variant!(self, values => values.truncate(len))
    }

    /// Rows where `mask` is true, in order. `mask` must match the column length.
    fn select(&self, mask: &[bool]) -> Column {
        map_variant!(self, values => values
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(value, _)| value.clone())
            .collect())
    }
}

macro_rules! typed_accessor {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $item:ty, $expected:literal) => {
        $(#[$doc])*
        pub fn $name(&self, field: &str) -> SessionResult<&[$item]> {
            match self.column(field)? {
                Column::$variant(values) => Ok(values),
                other => Err(SessionError::ColumnType {
                    field: field.to_string(),
                    expected: $expected,
                    found: other.type_name(),
                }),
            }
        }
    };
}

/// Ordered, named, equal-length columns; one row per trial
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialTable {
    n_rows: usize,
    order: Vec<String>,
    columns: AHashMap<String, Column>,
}

impl TrialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, column)` pairs, in order
    pub fn from_columns<I, S>(columns: I) -> SessionResult<Self>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, column) in columns {
            table.insert(name, column)?;
        }
        Ok(table)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.order.len()
    }

    /// True when the table has no rows
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.columns.contains_key(field)
    }

    /// Insert a column, replacing (in place) any column with the same name
    ///
    /// The first column fixes the row count; every later column must match it.
    pub fn insert(&mut self, field: impl Into<String>, column: Column) -> SessionResult<()> {
        let field = field.into();
        if self.order.is_empty() {
            self.n_rows = column.len();
        } else if column.len() != self.n_rows {
            return Err(SessionError::ColumnLength {
                field,
                expected: self.n_rows,
                actual: column.len(),
            });
        }

        if self.columns.insert(field.clone(), column).is_none() {
            self.order.push(field);
        }
        Ok(())
    }

    pub fn column(&self, field: &str) -> SessionResult<&Column> {
        self.columns
            .get(field)
            .ok_or_else(|| SessionError::MissingField(field.to_string()))
    }

    /// Copy `from` to a new column named `to`, leaving `from` intact
    pub fn copy_column(&mut self, from: &str, to: &str) -> SessionResult<()> {
        if from == to {
            return self.column(from).map(|_| ());
        }
        let column = self.column(from)?.clone();
        self.insert(to, column)
    }

    typed_accessor!(numbers, Number, Option<f64>, "number");
    typed_accessor!(flags, Flag, bool, "flag");
    typed_accessor!(categories, Category, Option<usize>, "category");
    typed_accessor!(series, Series, Vec<f64>, "series");
    typed_accessor!(spikes, Spikes, TrialSpikes, "spikes");
    typed_accessor!(regions, Regions, Arc<[String]>, "regions");
    typed_accessor!(events, Events, Vec<usize>, "events");
    typed_accessor!(directions, Directions, Vec<bool>, "directions");
    typed_accessor!(text, Text, String, "text");

    /// Keep only the first `n_rows` rows; no-op if the table is already shorter
    pub fn truncate(&mut self, n_rows: usize) {
        if n_rows >= self.n_rows {
            return;
        }
        for column in self.columns.values_mut() {
            column.truncate(n_rows);
        }
        self.n_rows = n_rows;
    }

    /// New table holding the rows where `mask` is true
    pub fn filter(&self, mask: &[bool]) -> SessionResult<TrialTable> {
        if mask.len() != self.n_rows {
            return Err(SessionError::MaskLength {
                expected: self.n_rows,
                actual: mask.len(),
            });
        }

        let columns = self
            .order
            .iter()
            .map(|name| (name.clone(), self.columns[name].select(mask)))
            .collect();

        Ok(TrialTable {
            n_rows: mask.iter().filter(|keep| **keep).count(),
            order: self.order.clone(),
            columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TrialTable {
        TrialTable::from_columns([
            ("TrialError", Column::Number(vec![Some(0.0), Some(6.0), None])),
            (
                "pos_x",
                Column::Series(vec![vec![1.0, 2.0], vec![], vec![3.0]]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_insert_checks_length() {
        let mut table = sample();
        let err = table
            .insert("bad", Column::Flag(vec![true]))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::ColumnLength { expected: 3, actual: 1, .. }
        ));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut table = sample();
        table
            .insert("TrialError", Column::Number(vec![None, None, None]))
            .unwrap();
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(names, vec!["TrialError", "pos_x"]);
        assert_eq!(table.numbers("TrialError").unwrap(), &[None, None, None]);
    }

    #[test]
    fn test_typed_access() {
        let table = sample();
        assert_eq!(table.series("pos_x").unwrap()[0], vec![1.0, 2.0]);
        let err = table.series("TrialError").unwrap_err();
        assert!(matches!(
            err,
            SessionError::ColumnType { expected: "series", found: "number", .. }
        ));
        assert!(matches!(
            table.numbers("nope").unwrap_err(),
            SessionError::MissingField(name) if name == "nope"
        ));
    }

    #[test]
    fn test_truncate_keeps_first_rows() {
        let mut table = sample();
        table.truncate(2);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.numbers("TrialError").unwrap(), &[Some(0.0), Some(6.0)]);
        assert_eq!(table.series("pos_x").unwrap().len(), 2);

        table.truncate(10);
        assert_eq!(table.n_rows(), 2);
    }

    #[test]
    fn test_filter_is_a_copy() {
        let table = sample();
        let filtered = table.filter(&[true, false, true]).unwrap();
        assert_eq!(filtered.n_rows(), 2);
        assert_eq!(filtered.numbers("TrialError").unwrap(), &[Some(0.0), None]);
        assert_eq!(filtered.series("pos_x").unwrap()[1], vec![3.0]);
        assert_eq!(table.n_rows(), 3);

        assert!(matches!(
            table.filter(&[true]).unwrap_err(),
            SessionError::MaskLength { expected: 3, actual: 1 }
        ));
    }

    #[test]
    fn test_copy_column() {
        let mut table = sample();
        table.copy_column("pos_x", "position").unwrap();
        assert_eq!(table.series("position").unwrap(), table.series("pos_x").unwrap());
        assert!(table.copy_column("missing", "x").is_err());
    }
}
