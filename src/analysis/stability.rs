//! Stable-period detection.
//!
//! A channel is stable at time `t` when the range (max - min) of its values in
//! the time-bounded window `(t - window, t]` does not exceed a threshold.
//! Consecutive stable rows form one [`StableInterval`]. The window is bounded
//! by time, not sample count, so it adapts to irregular sampling.
//!
//! The oil-temperature gate is a plain threshold filter that shares the same
//! interface so it can be intersected with the stability detectors.

use serde::Serialize;
use std::collections::VecDeque;

use super::statistics::mean;
use super::*;
use crate::settings::{OilGateConfig, StabilityConfig};

/// Contiguous run of stable timestamps for one channel
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StableInterval {
    pub channel: String,
    /// Member timestamps in milliseconds, ascending
    pub times: Vec<f64>,
    /// Mean channel value over the interval (nulls skipped)
    pub mean: Option<f64>,
}

impl StableInterval {
    pub fn start(&self) -> Option<f64> {
        self.times.first().copied()
    }

    pub fn end(&self) -> Option<f64> {
        self.times.last().copied()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Output of one stable-time filter
#[derive(Clone, Debug)]
pub struct StabilityResult {
    pub channel: String,
    pub intervals: Vec<StableInterval>,
    pub metadata: AnalysisMetadata,
}

impl StabilityResult {
    /// Total number of stable timestamps over all intervals
    pub fn stable_count(&self) -> usize {
        self.intervals.iter().map(|i| i.len()).sum()
    }
}

/// A filter that selects the timestamps of a frame where one channel
/// satisfies its criterion
pub trait StableTimeFilter: Send + Sync {
    /// Unique identifier for this filter
    fn id(&self) -> &str;

    /// Human-readable algorithm name
    fn name(&self) -> &str;

    /// Channel the filter reads
    fn channel(&self) -> &str;

    /// Find the stable intervals of the channel
    fn detect(&self, frame: &Frame) -> Result<StabilityResult, AnalysisError>;

    /// Clone into a boxed trait object
    fn clone_box(&self) -> Box<dyn StableTimeFilter>;
}

impl Clone for Box<dyn StableTimeFilter> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

// ============================================================================
// Rolling-range stability detector
// ============================================================================

/// Rolling-range stability detector for one channel
#[derive(Clone, Debug)]
pub struct StabilityDetector {
    pub channel: String,
    pub threshold: f64,
    pub window_ms: f64,
}

impl From<&StabilityConfig> for StabilityDetector {
    fn from(config: &StabilityConfig) -> Self {
        Self {
            channel: config.channel.clone(),
            threshold: config.threshold,
            window_ms: config.window_ms,
        }
    }
}

impl StabilityDetector {
    pub fn new(channel: impl Into<String>, threshold: f64, window_ms: f64) -> Self {
        Self {
            channel: channel.into(),
            threshold,
            window_ms,
        }
    }
}

impl StableTimeFilter for StabilityDetector {
    fn id(&self) -> &str {
        "rolling_range"
    }

    fn name(&self) -> &str {
        "Rolling Range Stability"
    }

    fn channel(&self) -> &str {
        &self.channel
    }

    fn detect(&self, frame: &Frame) -> Result<StabilityResult, AnalysisError> {
        if !(self.window_ms > 0.0) {
            return Err(AnalysisError::InvalidParameter(format!(
                "window must be positive, got {}",
                self.window_ms
            )));
        }
        let values = require_column(frame, &self.channel)?;

        let (intervals, computation_time) = timed_analyze(|| {
            find_stable_intervals(&frame.times, values, self.threshold, self.window_ms)
        });

        let mut metadata = AnalysisMetadata::new(self.name())
            .with_parameter("channel", &self.channel)
            .with_parameter("threshold", self.threshold)
            .with_parameter("window_ms", self.window_ms);
        metadata.computation_time_ms = computation_time;

        let intervals: Vec<StableInterval> = intervals
            .into_iter()
            .map(|times| {
                let interval_values = values_at(frame, values, &times);
                StableInterval {
                    channel: self.channel.clone(),
                    mean: mean(&interval_values),
                    times,
                }
            })
            .collect();

        for (i, interval) in intervals.iter().enumerate() {
            tracing::debug!(
                "{} interval {}: {} rows, mean {:?}",
                self.channel,
                i,
                interval.len(),
                interval.mean
            );
        }

        if intervals.is_empty() {
            tracing::warn!("No stable intervals for '{}'", self.channel);
            metadata
                .warnings
                .push(format!("no stable intervals for '{}'", self.channel));
        } else {
            tracing::info!(
                "Found {} stable intervals for '{}'",
                intervals.len(),
                self.channel
            );
        }

        Ok(StabilityResult {
            channel: self.channel.clone(),
            intervals,
            metadata,
        })
    }

    fn clone_box(&self) -> Box<dyn StableTimeFilter> {
        Box::new(self.clone())
    }
}

/// Values of `column` at the given frame times (both ascending)
fn values_at(frame: &Frame, column: &[Option<f64>], times: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(times.len());
    let mut row = 0;
    for &t in times {
        while row < frame.times.len() && frame.times[row] < t {
            row += 1;
        }
        if row < frame.times.len() && frame.times[row] == t {
            out.push(column.get(row).copied().flatten());
        }
    }
    out
}

/// Per-row stability mask.
///
/// `times` must be ascending. Row `i` looks at every non-null value with a
/// time in `(times[i] - window_ms, times[i]]`. Rows whose window holds no
/// value are unstable. Runs in linear time using monotonic deques.
pub fn stability_mask(
    times: &[f64],
    values: &[Option<f64>],
    threshold: f64,
    window_ms: f64,
) -> Vec<bool> {
    let mut mask = Vec::with_capacity(times.len());
    // Indices of candidate maxima (values decreasing) and minima (increasing)
    let mut max_q: VecDeque<usize> = VecDeque::new();
    let mut min_q: VecDeque<usize> = VecDeque::new();
    let mut start = 0;

    for (i, &t) in times.iter().enumerate() {
        if let Some(v) = values.get(i).copied().flatten() {
            while max_q
                .back()
                .is_some_and(|&j| values[j].is_some_and(|x| x <= v))
            {
                max_q.pop_back();
            }
            max_q.push_back(i);

            while min_q
                .back()
                .is_some_and(|&j| values[j].is_some_and(|x| x >= v))
            {
                min_q.pop_back();
            }
            min_q.push_back(i);
        }

        while start < i && times[start] <= t - window_ms {
            start += 1;
        }
        while max_q.front().is_some_and(|&j| j < start) {
            max_q.pop_front();
        }
        while min_q.front().is_some_and(|&j| j < start) {
            min_q.pop_front();
        }

        let stable = match (max_q.front(), min_q.front()) {
            (Some(&hi), Some(&lo)) => match (values[hi], values[lo]) {
                (Some(hi), Some(lo)) => hi - lo <= threshold,
                _ => false,
            },
            _ => false,
        };
        mask.push(stable);
    }

    mask
}

/// Group the rows where the rolling range stays within `threshold` into
/// maximal contiguous runs of timestamps.
pub fn find_stable_intervals(
    times: &[f64],
    values: &[Option<f64>],
    threshold: f64,
    window_ms: f64,
) -> Vec<Vec<f64>> {
    let mask = stability_mask(times, values, threshold, window_ms);
    group_runs(times, &mask)
}

/// Split `times` into maximal runs where `mask` is true
pub fn group_runs(times: &[f64], mask: &[bool]) -> Vec<Vec<f64>> {
    let mut runs = Vec::new();
    let mut current: Vec<f64> = Vec::new();

    for (&t, &stable) in times.iter().zip(mask) {
        if stable {
            current.push(t);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

// ============================================================================
// Oil-temperature gate
// ============================================================================

/// Threshold filter on oil temperature that excludes cold-start transients.
///
/// When no row reaches the minimum temperature the sensor is assumed faulty
/// and the gate passes every row.
#[derive(Clone, Debug)]
pub struct OilTemperatureGate {
    pub channel: String,
    pub min_temperature: f64,
}

impl From<&OilGateConfig> for OilTemperatureGate {
    fn from(config: &OilGateConfig) -> Self {
        Self {
            channel: config.channel.clone(),
            min_temperature: config.min_temperature,
        }
    }
}

impl Default for OilTemperatureGate {
    fn default() -> Self {
        Self::from(&OilGateConfig::default())
    }
}

impl OilTemperatureGate {
    /// Timestamps that pass the gate, and whether the gate failed open
    pub fn passing_times(&self, times: &[f64], values: &[Option<f64>]) -> (Vec<f64>, bool) {
        let passing: Vec<f64> = times
            .iter()
            .zip(values)
            .filter(|(_, v)| v.is_some_and(|v| v >= self.min_temperature))
            .map(|(t, _)| *t)
            .collect();

        if passing.is_empty() {
            (times.to_vec(), true)
        } else {
            (passing, false)
        }
    }
}

impl StableTimeFilter for OilTemperatureGate {
    fn id(&self) -> &str {
        "oil_temperature_gate"
    }

    fn name(&self) -> &str {
        "Oil Temperature Gate"
    }

    fn channel(&self) -> &str {
        &self.channel
    }

    fn detect(&self, frame: &Frame) -> Result<StabilityResult, AnalysisError> {
        let values = require_column(frame, &self.channel)?;

        let ((times, failed_open), computation_time) =
            timed_analyze(|| self.passing_times(&frame.times, values));

        let mut metadata = AnalysisMetadata::new(self.name())
            .with_parameter("channel", &self.channel)
            .with_parameter("min_temperature", self.min_temperature);
        metadata.computation_time_ms = computation_time;

        if failed_open {
            tracing::warn!(
                "No rows with '{}' >= {}, passing all rows",
                self.channel,
                self.min_temperature
            );
            metadata.warnings.push(format!(
                "oil temperature never reached {}, gate passed all rows",
                self.min_temperature
            ));
        }

        let intervals = if times.is_empty() {
            Vec::new()
        } else {
            let gated = values_at(frame, values, &times);
            vec![StableInterval {
                channel: self.channel.clone(),
                mean: mean(&gated),
                times,
            }]
        };

        Ok(StabilityResult {
            channel: self.channel.clone(),
            intervals,
            metadata,
        })
    }

    fn clone_box(&self) -> Box<dyn StableTimeFilter> {
        Box::new(self.clone())
    }
}
