//! Tests for the intersection of stable sets
//!
//! Tests cover:
//! - Time-set intersection across channels
//! - Empty channel lists
//! - Row extraction in frame order
//! - Parameter validation

use crate::common::assertions::assert_frame_aligned;
use crate::common::synthetic::{constant, step, uniform_times};
use diesel_stable::analysis::intersect::IntervalIntersector;
use diesel_stable::analysis::stability::{StabilityDetector, StableInterval, StableTimeFilter};
use diesel_stable::analysis::AnalysisError;
use diesel_stable::frame::Frame;

fn interval(channel: &str, times: &[f64]) -> StableInterval {
    StableInterval {
        channel: channel.to_string(),
        times: times.to_vec(),
        mean: None,
    }
}

fn sample_frame() -> Frame {
    let mut frame = Frame::with_times(uniform_times(6, 100.0));
    frame.set_column("a", (0..6).map(|i| Some(i as f64)).collect());
    frame.set_column("b", constant(6, 1.0));
    frame
}

// ============================================
// Time Set Tests
// ============================================

#[test]
fn test_intersect_times() {
    let per_channel = vec![
        vec![interval("a", &[0.0, 100.0, 200.0]), interval("a", &[400.0])],
        vec![interval("b", &[100.0, 200.0, 300.0, 400.0])],
        vec![interval("c", &[0.0, 100.0, 400.0, 500.0])],
    ];
    let common = IntervalIntersector.intersect_times(&per_channel).unwrap();

    let mut times: Vec<f64> = common.into_iter().map(f64::from_bits).collect();
    times.sort_by(|a, b| a.total_cmp(b));
    assert_eq!(times, vec![100.0, 400.0]);
}

#[test]
fn test_empty_channel_empties_intersection() {
    let per_channel = vec![
        vec![interval("a", &[0.0, 100.0])],
        vec![],
        vec![interval("c", &[0.0, 100.0])],
    ];
    assert!(IntervalIntersector
        .intersect_times(&per_channel)
        .unwrap()
        .is_empty());

    let stable = IntervalIntersector
        .extract(&sample_frame(), &per_channel)
        .unwrap();
    assert!(stable.is_empty());
    assert_eq!(stable.columns.len(), 2);
}

#[test]
fn test_single_channel_rejected() {
    let result = IntervalIntersector.intersect_times(&[vec![interval("a", &[0.0])]]);
    assert!(matches!(result, Err(AnalysisError::InvalidParameter(_))));
}

// ============================================
// Extraction Tests
// ============================================

#[test]
fn test_extract_keeps_frame_order() {
    // Interval lists deliberately out of order
    let per_channel = vec![
        vec![interval("a", &[500.0, 300.0]), interval("a", &[100.0])],
        vec![interval("b", &[100.0, 300.0, 500.0])],
    ];
    let stable = IntervalIntersector
        .extract(&sample_frame(), &per_channel)
        .unwrap();

    assert_eq!(stable.times, vec![100.0, 300.0, 500.0]);
    assert_eq!(stable.column("a").unwrap(), &[Some(1.0), Some(3.0), Some(5.0)]);
    assert_frame_aligned(&stable);
}

#[test]
fn test_extract_results_from_detectors() {
    let mut frame = Frame::with_times(uniform_times(40, 100.0));
    frame.set_column("rpm", step(40, 20, 1500.0, 1800.0));
    frame.set_column("torque", constant(40, 200.0));

    let results = vec![
        StabilityDetector::new("rpm", 20.0, 500.0).detect(&frame).unwrap(),
        StabilityDetector::new("torque", 5.0, 500.0)
            .detect(&frame)
            .unwrap(),
    ];
    let stable = IntervalIntersector.extract_results(&frame, &results).unwrap();

    // 20 rows before the step, 16 after it once the window has cleared
    assert_eq!(stable.len(), 36);
    assert!(!stable.times.contains(&2000.0));
    assert!(stable.times.contains(&2400.0));
    assert_frame_aligned(&stable);
}
