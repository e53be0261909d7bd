//! Columnar table with a single shared time axis.
//!
//! A `Frame` is what the pipeline hands from stage to stage once the raw
//! channels have been synchronized: one `Time` axis in milliseconds and any
//! number of nullable numeric columns of the same length.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Name of the shared time column in exported tables
pub const TIME_COLUMN: &str = "Time";

/// One named column; `None` marks a missing sample
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Frame {
    /// Time axis in milliseconds
    pub times: Vec<f64>,
    pub columns: Vec<Column>,
}

impl Frame {
    /// Create an empty frame on the given time axis
    pub fn with_times(times: Vec<f64>) -> Self {
        Self {
            times,
            columns: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.find_column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Add a column, replacing any existing column of the same name in place
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        let name = name.into();
        debug_assert_eq!(values.len(), self.times.len());
        match self.find_column_index(&name) {
            Some(idx) => self.columns[idx].values = values,
            None => self.columns.push(Column::new(name, values)),
        }
    }

    /// Add a column holding the same value on every row
    pub fn set_constant_column(&mut self, name: impl Into<String>, value: f64) {
        let values = vec![Some(value); self.times.len()];
        self.set_column(name, values);
    }

    /// Remove a column if present, returning it
    pub fn drop_column(&mut self, name: &str) -> Option<Column> {
        self.find_column_index(name).map(|idx| self.columns.remove(idx))
    }

    /// Keep only the rows whose time value is in `keep`, preserving order.
    /// Time values are compared bit-for-bit because they all originate from
    /// the same axis.
    pub fn filter_times(&self, keep: &HashSet<u64>) -> Frame {
        let mask: Vec<bool> = self
            .times
            .iter()
            .map(|t| keep.contains(&t.to_bits()))
            .collect();
        self.filter_rows(&mask)
    }

    /// Keep rows where `mask` is true
    pub fn filter_rows(&self, mask: &[bool]) -> Frame {
        let pick = |i: usize| mask.get(i).copied().unwrap_or(false);

        let times = self
            .times
            .iter()
            .enumerate()
            .filter(|(i, _)| pick(*i))
            .map(|(_, t)| *t)
            .collect();

        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: c
                    .values
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| pick(*i))
                    .map(|(_, v)| *v)
                    .collect(),
            })
            .collect();

        Frame { times, columns }
    }

    /// Time axis as absolute timestamps (milliseconds since the Unix epoch)
    pub fn timestamps(&self) -> Vec<Option<DateTime<Utc>>> {
        self.times.iter().map(|&ms| ms_to_datetime(ms)).collect()
    }

    /// Rename columns according to `rename`; names without a mapping are kept
    pub fn rename_columns<F>(&mut self, rename: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for column in &mut self.columns {
            if let Some(new_name) = rename(&column.name) {
                column.name = new_name;
            }
        }
    }
}

/// Convert a millisecond offset to an absolute UTC timestamp
pub fn ms_to_datetime(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((ms * 1000.0).round() as i64)
}
