//! Intersection of stable-time sets across channels.

use std::collections::HashSet;

use super::stability::{StabilityResult, StableInterval};
use super::AnalysisError;
use crate::frame::Frame;

/// Intersects per-channel stable intervals and extracts the matching rows
#[derive(Clone, Debug, Default)]
pub struct IntervalIntersector;

impl IntervalIntersector {
    /// Timestamps present in every channel's interval list.
    ///
    /// An empty list for any channel makes the whole intersection empty.
    pub fn intersect_times(
        &self,
        per_channel: &[Vec<StableInterval>],
    ) -> Result<HashSet<u64>, AnalysisError> {
        if per_channel.len() < 2 {
            return Err(AnalysisError::InvalidParameter(format!(
                "intersection needs at least two channels, got {}",
                per_channel.len()
            )));
        }

        let mut sets = per_channel.iter().map(|intervals| {
            intervals
                .iter()
                .flat_map(|i| i.times.iter().map(|t| t.to_bits()))
                .collect::<HashSet<u64>>()
        });

        let mut common = sets.next().unwrap_or_default();
        for set in sets {
            if common.is_empty() {
                break;
            }
            common.retain(|t| set.contains(t));
        }

        Ok(common)
    }

    /// Rows of `frame` whose time is stable in every channel, in the frame's
    /// time order. An empty frame means no globally stable period.
    pub fn extract(
        &self,
        frame: &Frame,
        per_channel: &[Vec<StableInterval>],
    ) -> Result<Frame, AnalysisError> {
        let common = self.intersect_times(per_channel)?;
        let stable = frame.filter_times(&common);

        if stable.is_empty() {
            tracing::warn!("Intersection of {} stable sets is empty", per_channel.len());
        } else {
            tracing::info!(
                "Intersection kept {} of {} rows",
                stable.len(),
                frame.len()
            );
        }

        Ok(stable)
    }

    /// Convenience wrapper over detector results
    pub fn extract_results(
        &self,
        frame: &Frame,
        results: &[StabilityResult],
    ) -> Result<Frame, AnalysisError> {
        let per_channel: Vec<Vec<StableInterval>> =
            results.iter().map(|r| r.intervals.clone()).collect();
        self.extract(frame, &per_channel)
    }
}
