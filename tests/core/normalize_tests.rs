//! Tests for bench header normalization
//!
//! Tests cover:
//! - Short English names for bench channels and fuel properties
//! - Headers without a mapping
//! - Renaming a frame

use diesel_stable::frame::Frame;
use diesel_stable::normalize::{channels, english_name, english_rename};

fn short(name: &str) -> Option<String> {
    english_rename(name)
}

// ============================================
// Basic Normalization Tests
// ============================================

#[test]
fn test_normalize_bench_channels() {
    assert_eq!(short(channels::TURBO_PRESSURE).as_deref(), Some("Turbo Pressure"));
    assert_eq!(short(channels::COOLANT_TEMP).as_deref(), Some("Coolant Temp"));
    assert_eq!(short(channels::OIL_TEMP).as_deref(), Some("Oil Temp"));
    assert_eq!(short(channels::MAF).as_deref(), Some("MAF"));
    assert_eq!(short(channels::POWER).as_deref(), Some("Power"));
}

#[test]
fn test_normalize_fuel_properties() {
    assert_eq!(short("Cetane number").as_deref(), Some("Cetane number"));
    assert_eq!(short("Density at 15 °C, kg/m3").as_deref(), Some("Density-15"));
    assert_eq!(short("Viscosity at 40 °C, mm2/s").as_deref(), Some("Viscosity-40"));
    assert_eq!(short("LHV (Lower Heating Value), MJ/kg").as_deref(), Some("LHV"));
}

#[test]
fn test_normalize_trims_whitespace() {
    assert_eq!(short(" Obroty[obr/min] ").as_deref(), Some("RPM"));
}

#[test]
fn test_unmapped_names_pass_through() {
    assert!(short("Czas [ms]").is_none());
    assert!(english_name(channels::EXHAUST_TEMP_1).is_none());
    assert!(english_name("").is_none());
}

#[test]
fn test_full_names() {
    let name = english_name(channels::MAF).unwrap();
    assert_eq!(name.full, "Mass Air Flow [kg/h]");
    assert_eq!(name.short, "MAF");
}

// ============================================
// Frame Renaming Tests
// ============================================

#[test]
fn test_rename_frame_columns() {
    let mut frame = Frame::with_times(vec![0.0]);
    frame.set_column(channels::RPM, vec![Some(1500.0)]);
    frame.set_column(channels::EXHAUST_TEMP_MEAN, vec![Some(415.0)]);
    frame.set_column(channels::TURBO_PRESSURE, vec![Some(1.5e5)]);
    frame.set_column("Custom", vec![None]);

    frame.rename_columns(english_rename);
    assert_eq!(
        frame.column_names(),
        vec!["RPM", "Exhaust Temp", "Turbo Pressure", "Custom"]
    );
}
