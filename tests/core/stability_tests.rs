//! Tests for stability detection and the oil-temperature gate
//!
//! Tests cover:
//! - Rolling-range mask on constant, step and alternating signals
//! - Interval grouping and interval means
//! - Null handling
//! - Oil-temperature gate including the fail-open case
//! - Filter trait objects

use crate::common::float_cmp::{assert_approx_eq, DEFAULT_TOLERANCE};
use crate::common::synthetic::{constant, step, uniform_times};
use diesel_stable::analysis::stability::{
    group_runs, stability_mask, OilTemperatureGate, StabilityDetector, StableTimeFilter,
};
use diesel_stable::analysis::AnalysisError;
use diesel_stable::frame::Frame;

const RPM: &str = "Obroty[obr/min]";
const OIL: &str = "Temp. oleju w misce[°C]";

fn frame_with(channel: &str, times: Vec<f64>, values: Vec<Option<f64>>) -> Frame {
    let mut frame = Frame::with_times(times);
    frame.set_column(channel, values);
    frame
}

// ============================================
// Rolling Range Tests
// ============================================

#[test]
fn test_constant_signal_is_one_interval() {
    let times = uniform_times(50, 100.0);
    let frame = frame_with(RPM, times.clone(), constant(50, 1500.0));

    let result = StabilityDetector::new(RPM, 20.0, 8000.0)
        .detect(&frame)
        .unwrap();

    assert_eq!(result.intervals.len(), 1);
    assert_eq!(result.intervals[0].times, times);
    assert_eq!(result.intervals[0].mean, Some(1500.0));
    assert_eq!(result.stable_count(), 50);
    assert!(!result.metadata.has_warnings());
}

#[test]
fn test_alternating_signal_has_no_spanning_interval() {
    let values: Vec<Option<f64>> = (0..40)
        .map(|i| Some(if i % 2 == 0 { 1500.0 } else { 1600.0 }))
        .collect();
    let frame = frame_with(RPM, uniform_times(40, 100.0), values);

    let result = StabilityDetector::new(RPM, 20.0, 500.0)
        .detect(&frame)
        .unwrap();

    // Only the very first row, whose window holds a single value, qualifies
    assert!(result.intervals.iter().all(|i| i.len() == 1));
    assert!(result.stable_count() <= 1);
}

#[test]
fn test_step_change_unstable_for_one_window() {
    let times = uniform_times(40, 100.0);
    let values = step(40, 20, 1500.0, 1800.0);
    let mask = stability_mask(&times, &values, 20.0, 500.0);

    assert!(mask[..20].iter().all(|&m| m));
    // Rows 20..=23 still see a 1500 rpm sample inside (t - 500, t]
    assert!(mask[20..24].iter().all(|&m| !m));
    assert!(mask[24..].iter().all(|&m| m));
}

#[test]
fn test_step_change_interval_means() {
    let frame = frame_with(RPM, uniform_times(40, 100.0), step(40, 20, 1500.0, 1800.0));
    let result = StabilityDetector::new(RPM, 20.0, 500.0)
        .detect(&frame)
        .unwrap();

    assert_eq!(result.intervals.len(), 2);
    assert_eq!(result.intervals[0].start(), Some(0.0));
    assert_eq!(result.intervals[0].end(), Some(1900.0));
    assert_eq!(result.intervals[1].start(), Some(2400.0));
    assert_approx_eq(result.intervals[0].mean.unwrap(), 1500.0, DEFAULT_TOLERANCE);
    assert_approx_eq(result.intervals[1].mean.unwrap(), 1800.0, DEFAULT_TOLERANCE);
}

#[test]
fn test_small_noise_within_threshold() {
    let values: Vec<Option<f64>> = (0..30)
        .map(|i| Some(1500.0 + (i % 3) as f64 * 5.0))
        .collect();
    let frame = frame_with(RPM, uniform_times(30, 100.0), values);

    let result = StabilityDetector::new(RPM, 20.0, 1000.0)
        .detect(&frame)
        .unwrap();
    assert_eq!(result.intervals.len(), 1);
    assert_eq!(result.stable_count(), 30);
}

#[test]
fn test_threshold_is_inclusive() {
    let times = uniform_times(3, 100.0);
    let values = vec![Some(0.0), Some(20.0), Some(20.0)];
    let mask = stability_mask(&times, &values, 20.0, 1000.0);
    assert_eq!(mask, vec![true, true, true]);
}

// ============================================
// Null Handling Tests
// ============================================

#[test]
fn test_nulls_are_skipped_in_window() {
    let mut values = constant(20, 1500.0);
    values[5] = None;
    values[6] = None;
    let frame = frame_with(RPM, uniform_times(20, 100.0), values);

    let result = StabilityDetector::new(RPM, 20.0, 1000.0)
        .detect(&frame)
        .unwrap();
    assert_eq!(result.intervals.len(), 1);
    assert_eq!(result.intervals[0].mean, Some(1500.0));
}

#[test]
fn test_all_null_channel_has_no_intervals() {
    let frame = frame_with(RPM, uniform_times(10, 100.0), vec![None; 10]);
    let result = StabilityDetector::new(RPM, 20.0, 1000.0)
        .detect(&frame)
        .unwrap();
    assert!(result.intervals.is_empty());
    assert!(result.metadata.has_warnings());
}

#[test]
fn test_missing_channel_is_error() {
    let frame = frame_with(OIL, uniform_times(10, 100.0), constant(10, 80.0));
    let err = StabilityDetector::new(RPM, 20.0, 1000.0)
        .detect(&frame)
        .unwrap_err();
    assert_eq!(err, AnalysisError::MissingColumn(RPM.to_string()));
    assert!(!err.is_fatal());
}

#[test]
fn test_non_positive_window_rejected() {
    let frame = frame_with(RPM, uniform_times(10, 100.0), constant(10, 1500.0));
    let result = StabilityDetector::new(RPM, 20.0, 0.0).detect(&frame);
    assert!(matches!(result, Err(AnalysisError::InvalidParameter(_))));
}

#[test]
fn test_group_runs() {
    let times = uniform_times(6, 1.0);
    let mask = [true, true, false, true, false, true];
    assert_eq!(
        group_runs(&times, &mask),
        vec![vec![0.0, 1.0], vec![3.0], vec![5.0]]
    );
    assert!(group_runs(&times, &[false; 6]).is_empty());
}

// ============================================
// Oil Temperature Gate Tests
// ============================================

#[test]
fn test_oil_gate_passes_warm_rows() {
    let values = vec![Some(30.0), Some(49.9), Some(50.0), None, Some(80.0)];
    let frame = frame_with(OIL, uniform_times(5, 100.0), values);

    let result = OilTemperatureGate::default().detect(&frame).unwrap();
    let passing: Vec<f64> = result
        .intervals
        .iter()
        .flat_map(|i| i.times.clone())
        .collect();
    assert_eq!(passing, vec![200.0, 400.0]);
    assert!(!result.metadata.has_warnings());
}

#[test]
fn test_oil_gate_fails_open() {
    let frame = frame_with(OIL, uniform_times(5, 100.0), constant(5, 25.0));

    let result = OilTemperatureGate::default().detect(&frame).unwrap();
    assert_eq!(result.stable_count(), 5);
    assert!(result.metadata.has_warnings());
}

#[test]
fn test_oil_gate_passing_times() {
    let gate = OilTemperatureGate {
        channel: OIL.to_string(),
        min_temperature: 60.0,
    };
    let (times, failed_open) =
        gate.passing_times(&[0.0, 1.0, 2.0], &[Some(59.0), Some(61.0), Some(60.0)]);
    assert_eq!(times, vec![1.0, 2.0]);
    assert!(!failed_open);
}

#[test]
fn test_oil_gate_missing_channel() {
    let frame = frame_with(RPM, uniform_times(5, 100.0), constant(5, 1500.0));
    let result = OilTemperatureGate::default().detect(&frame);
    assert!(matches!(result, Err(AnalysisError::MissingColumn(_))));
}

// ============================================
// Filter Trait Tests
// ============================================

#[test]
fn test_boxed_filters() {
    let filters: Vec<Box<dyn StableTimeFilter>> = vec![
        Box::new(StabilityDetector::new(RPM, 20.0, 8000.0)),
        Box::new(OilTemperatureGate::default()),
    ];
    let cloned = filters.clone();

    assert_eq!(cloned[0].id(), "rolling_range");
    assert_eq!(cloned[0].channel(), RPM);
    assert_eq!(cloned[1].id(), "oil_temperature_gate");
    assert_eq!(cloned[1].channel(), OIL);
}
