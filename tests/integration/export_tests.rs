//! Tests for exported stable-period datasets
//!
//! Tests cover:
//! - English short headers
//! - Absolute timestamps in the Time column
//! - Quoting of fuel property headers
//! - Empty results

use crate::common::bench::steady_session;
use crate::common::synthetic::{fuel_table, raw_run};
use diesel_stable::export::{output_file_name, write_csv};
use diesel_stable::frame::Frame;
use diesel_stable::normalize::channels;
use diesel_stable::observer::NoopObserver;
use diesel_stable::pipeline::Pipeline;
use diesel_stable::settings::{OutputConfig, PipelineSettings};
use std::sync::Arc;

fn processed_frame() -> Frame {
    let pipeline = Pipeline::new(
        PipelineSettings::default(),
        fuel_table(),
        Arc::new(NoopObserver),
    )
    .unwrap();
    pipeline
        .process(&raw_run("ON", &steady_session()))
        .unwrap()
        .frame
}

// ============================================
// Header Tests
// ============================================

#[test]
fn test_english_headers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(output_file_name("obc 1500 ON.csv"));
    let config = OutputConfig {
        english_headers: true,
        delimiter: ';',
    };
    write_csv(&processed_frame(), &path, &config).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let header = content.lines().next().unwrap();
    assert_eq!(
        header,
        "Time;RPM;Torque;Fuel Consump;Oil Temp;Power;Turbo Pressure;Coolant Temp;MAF;\
         Fuel Temp;Turbo Air Temp;Exhaust Temp;Cetane number;Density-15;Flash pt"
    );
}

#[test]
fn test_source_headers_are_quoted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run_stable.csv");
    write_csv(&processed_frame(), &path, &OutputConfig::default()).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "Time");
    assert_eq!(&headers[1], channels::RPM);
    assert!(headers.iter().any(|h| h == "Flash point, °C"));
    assert!(headers.iter().all(|h| h != channels::HUMIDITY));
    assert_eq!(reader.records().count(), 321);
}

// ============================================
// Row Tests
// ============================================

#[test]
fn test_rows_and_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run_stable.csv");
    let config = OutputConfig {
        english_headers: true,
        delimiter: ';',
    };
    write_csv(&processed_frame(), &path, &config).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1 + 321);
    assert!(lines[1].starts_with("1970-01-01 00:00:00.000;1500;"));
    assert!(lines[200].starts_with("1970-01-01 00:00:19.900;1500;"));
    assert!(lines[201].starts_with("1970-01-01 00:00:27.900;1800;"));
    assert!(lines[1].ends_with(";51;832.5;55"));
}

#[test]
fn test_empty_frame_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty_stable.csv");

    let mut frame = Frame::with_times(Vec::new());
    frame.set_column(channels::POWER, Vec::new());
    write_csv(&frame, &path, &OutputConfig::default()).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().collect::<Vec<_>>(), vec!["Time,Moc[kW]"]);
}
