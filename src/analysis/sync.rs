//! Time synchronization of independently sampled channels.
//!
//! Every bench channel carries its own time column. The synchronizer picks one
//! reference time column, builds a sorted unique axis from it and resamples
//! every channel onto that axis by nearest-neighbour lookup. A sample is only
//! accepted when it lies within half the mean reference sampling interval.

use std::collections::HashSet;

use super::AnalysisError;
use crate::frame::Frame;
use crate::parsers::{ChannelPair, RawTable};

/// Result of synchronizing one run
#[derive(Clone, Debug, PartialEq)]
pub struct SynchronizedRun {
    /// One `Time` axis plus one column per channel pair
    pub frame: Frame,
    /// Matching tolerance in milliseconds
    pub tolerance_ms: f64,
    /// Value columns that were absent from the raw table (left all-null)
    pub missing_channels: Vec<String>,
}

/// Resamples a run's channels onto a common time axis
#[derive(Clone, Debug)]
pub struct TimeSynchronizer {
    /// Time column providing the reference axis
    pub reference_time_column: String,
}

impl TimeSynchronizer {
    pub fn new(reference_time_column: impl Into<String>) -> Self {
        Self {
            reference_time_column: reference_time_column.into(),
        }
    }

    /// Use the time column of `reference_channel` when given, otherwise the
    /// time column of the first pair
    pub fn for_pairs(
        pairs: &[ChannelPair],
        reference_channel: Option<&str>,
    ) -> Result<Self, AnalysisError> {
        let pair = match reference_channel {
            Some(channel) => pairs.iter().find(|p| p.value_column == channel),
            None => pairs.first(),
        };

        pair.map(|p| Self::new(&p.time_column)).ok_or_else(|| {
            AnalysisError::SynchronizationFailure(match reference_channel {
                Some(channel) => format!("reference channel '{}' has no time column", channel),
                None => "no channel pairs to take a reference axis from".to_string(),
            })
        })
    }

    pub fn synchronize(
        &self,
        table: &RawTable,
        pairs: &[ChannelPair],
    ) -> Result<SynchronizedRun, AnalysisError> {
        let reference = table.column(&self.reference_time_column).ok_or_else(|| {
            AnalysisError::SynchronizationFailure(format!(
                "reference time column '{}' not found",
                self.reference_time_column
            ))
        })?;

        let axis = reference_axis(&reference.values);
        if axis.is_empty() {
            return Err(AnalysisError::SynchronizationFailure(format!(
                "reference time column '{}' has no values",
                self.reference_time_column
            )));
        }

        let tolerance_ms = tolerance(&axis);
        let mut frame = Frame::with_times(axis);
        let mut missing_channels = Vec::new();

        for pair in pairs {
            if frame.has_column(&pair.value_column) {
                tracing::warn!("Channel '{}' listed twice, keeping the first", pair.value_column);
                continue;
            }

            let (times, values) = match (
                table.column(&pair.time_column),
                table.column(&pair.value_column),
            ) {
                (Some(t), Some(v)) => (&t.values, &v.values),
                _ => {
                    tracing::warn!(
                        "Channel '{}' (time '{}') not found, filling with nulls",
                        pair.value_column,
                        pair.time_column
                    );
                    missing_channels.push(pair.value_column.clone());
                    frame.set_column(&pair.value_column, vec![None; frame.len()]);
                    continue;
                }
            };

            let (sample_times, sample_values) = prepare_channel(times, values);
            let resampled =
                reindex_nearest(&frame.times, &sample_times, &sample_values, tolerance_ms);
            frame.set_column(&pair.value_column, resampled);
        }

        tracing::info!(
            "Synchronized {} channels onto {} rows (reference '{}', tolerance {:.3} ms)",
            pairs.len(),
            frame.len(),
            self.reference_time_column,
            tolerance_ms
        );

        Ok(SynchronizedRun {
            frame,
            tolerance_ms,
            missing_channels,
        })
    }
}

/// Unique, sorted, non-null reference times
pub fn reference_axis(times: &[Option<f64>]) -> Vec<f64> {
    let mut axis: Vec<f64> = times.iter().flatten().copied().collect();
    axis.sort_by(|a, b| a.total_cmp(b));
    axis.dedup();
    axis
}

/// Half the mean spacing of the axis; zero when there is a single point
pub fn tolerance(axis: &[f64]) -> f64 {
    if axis.len() < 2 {
        return 0.0;
    }
    let sum: f64 = axis.windows(2).map(|w| w[1] - w[0]).sum();
    sum / (axis.len() - 1) as f64 / 2.0
}

/// Drop rows with a null time or value, drop repeated timestamps keeping the
/// first, then sort by time
pub fn prepare_channel(times: &[Option<f64>], values: &[Option<f64>]) -> (Vec<f64>, Vec<f64>) {
    let mut seen = HashSet::new();
    let mut samples: Vec<(f64, f64)> = times
        .iter()
        .zip(values)
        .filter_map(|(t, v)| Some(((*t)?, (*v)?)))
        .filter(|(t, _)| seen.insert(t.to_bits()))
        .collect();

    samples.sort_by(|a, b| a.0.total_cmp(&b.0));
    samples.into_iter().unzip()
}

/// Resample `(times, values)` onto `axis`.
///
/// `times` must be sorted. Each axis point takes the value of the nearest
/// sample; on a tie the later sample wins. Samples further than `tolerance`
/// away leave the point null.
pub fn reindex_nearest(
    axis: &[f64],
    times: &[f64],
    values: &[f64],
    tolerance: f64,
) -> Vec<Option<f64>> {
    if times.is_empty() {
        return vec![None; axis.len()];
    }

    axis.iter()
        .map(|&x| {
            let right = times.partition_point(|&t| t < x);
            let nearest = if right < times.len() && times[right] == x {
                right
            } else if right == 0 {
                0
            } else if right == times.len() {
                right - 1
            } else {
                let left = right - 1;
                if x - times[left] < times[right] - x {
                    left
                } else {
                    right
                }
            };

            ((times[nearest] - x).abs() <= tolerance).then(|| values[nearest])
        })
        .collect()
}
