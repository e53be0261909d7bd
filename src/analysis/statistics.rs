//! Descriptive statistics over nullable channels.
//!
//! Used for per-interval diagnostics and the correction summary.

use serde::Serialize;

/// Container for descriptive statistics
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DescriptiveStats {
    /// Number of non-null samples
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

/// Compute descriptive statistics, skipping nulls.
///
/// Returns `None` when there is no non-null sample.
pub fn compute_descriptive_stats(data: &[Option<f64>]) -> Option<DescriptiveStats> {
    let values: Vec<f64> = data.iter().flatten().copied().collect();
    if values.is_empty() {
        return None;
    }

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;

    // Sample variance (n - 1), two-pass
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1).max(1) as f64;
    let stdev = variance.sqrt();

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let mut sorted = values;
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };

    Some(DescriptiveStats {
        count: n,
        mean,
        median,
        stdev,
        min,
        max,
        range: max - min,
    })
}

/// Null-skipping mean
pub fn mean(data: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = data
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Percent change from `before` to `after` for every row where both exist
/// and `before` is non-zero
pub fn percent_changes(before: &[Option<f64>], after: &[Option<f64>]) -> Vec<Option<f64>> {
    before
        .iter()
        .zip(after)
        .map(|(b, a)| match (b, a) {
            (Some(b), Some(a)) if b.abs() > f64::EPSILON => Some((a - b) / b * 100.0),
            _ => None,
        })
        .collect()
}
