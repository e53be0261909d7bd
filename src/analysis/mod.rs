//! Analysis stages for stable-period extraction.
//!
//! The pipeline runs these stages in order on every test-bench run:
//!
//! - [`sync`] - align independently sampled channels onto one time axis
//! - [`stability`] - per-channel rolling-range stability detection and the
//!   oil-temperature gate
//! - [`intersect`] - intersect the stable sets and extract matching rows
//! - [`correction`] - atmospheric power/torque correction and exhaust
//!   temperature averaging
//! - [`statistics`] - small descriptive statistics used for diagnostics
//!
//! Each stage reports failures through [`AnalysisError`]. Whether a failure
//! skips a run or is fatal for it is decided by [`AnalysisError::is_fatal`].

pub mod correction;
pub mod intersect;
pub mod statistics;
pub mod stability;
pub mod sync;

use crate::frame::Frame;
use std::time::Instant;
use thiserror::Error;

/// Errors that can occur during analysis
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// A required channel is missing from the run
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    /// A detector found nothing stable, or the intersection was empty
    #[error("No stable period: {0}")]
    NoStablePeriod(String),
    /// The run's fuel has no entry in the fuel table
    #[error("Fuel '{0}' not found in fuel table")]
    UnmatchedFuel(String),
    /// The reference time axis is missing or unusable
    #[error("Time synchronization failed: {0}")]
    SynchronizationFailure(String),
    /// Invalid parameter configuration
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl AnalysisError {
    /// Fatal errors abort the run; the others only mean "skip this run"
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AnalysisError::UnmatchedFuel(_) | AnalysisError::SynchronizationFailure(_)
        )
    }
}

/// Metadata about a stage run, recorded in logs and the metadata store
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct AnalysisMetadata {
    /// Name of the algorithm used
    pub algorithm: String,
    /// Key parameters and their values
    pub parameters: Vec<(String, String)>,
    /// Warning messages about the analysis
    pub warnings: Vec<String>,
    /// Time taken for computation in milliseconds
    pub computation_time_ms: u64,
}

impl AnalysisMetadata {
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            ..Default::default()
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.parameters.push((key.into(), value.to_string()));
        self
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Helper function to measure analysis execution time
pub fn timed_analyze<F, T>(f: F) -> (T, u64)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed().as_millis() as u64;
    (result, elapsed)
}

/// Helper to get a required column or return an error
pub fn require_column<'a>(frame: &'a Frame, name: &str) -> Result<&'a [Option<f64>], AnalysisError> {
    frame
        .column(name)
        .ok_or_else(|| AnalysisError::MissingColumn(name.to_string()))
}

/// Fetch a column that holds at least one value. Absent and all-null
/// columns are both pushed onto `missing` and yield an empty slice.
pub fn usable_column<'a>(
    frame: &'a Frame,
    name: &str,
    missing: &mut Vec<String>,
) -> &'a [Option<f64>] {
    match frame.column(name) {
        Some(values) if values.iter().any(Option::is_some) => values,
        _ => {
            missing.push(name.to_string());
            &[]
        }
    }
}
