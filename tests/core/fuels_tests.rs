//! Tests for the fuel property table and join
//!
//! Tests cover:
//! - Loading the reference table from JSON
//! - Column naming
//! - Broadcasting properties onto a stable frame
//! - Unmatched fuels

use crate::common::synthetic::{constant, fuel_table, uniform_times};
use diesel_stable::analysis::AnalysisError;
use diesel_stable::frame::Frame;
use diesel_stable::fuels::{FuelPropertyJoiner, FuelTable};

fn stable_frame() -> Frame {
    let mut frame = Frame::with_times(uniform_times(4, 100.0));
    frame.set_column("Obroty[obr/min]", constant(4, 1500.0));
    frame
}

// ============================================
// Table Tests
// ============================================

#[test]
fn test_load_table_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fuels.json");
    std::fs::write(&path, serde_json::to_string(&fuel_table()).unwrap()).unwrap();

    let table = FuelTable::load(&path).unwrap();
    assert_eq!(table.short_names(), vec!["ON", "HVO"]);
    assert_eq!(table.find("ON").unwrap().properties.len(), 3);
    assert!(table.find("on").is_none());
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(FuelTable::load(&dir.path().join("nope.json")).is_err());
}

#[test]
fn test_limits_in_json() {
    let table = FuelTable::from_json(
        r#"[{ "short_name": "B20", "properties": [
            { "name": "Viscosity at 40 °C", "value": 3.4, "unit": "mm2/s",
              "lower_limit": 2.0, "upper_limit": 4.5 }
        ] }]"#,
    )
    .unwrap();
    let property = &table.find("B20").unwrap().properties[0];
    assert_eq!(property.lower_limit, Some(2.0));
    assert_eq!(property.column_name(), "Viscosity at 40 °C, mm2/s");
}

// ============================================
// Join Tests
// ============================================

#[test]
fn test_join_broadcasts_cetane_number() {
    let mut frame = stable_frame();
    let added = FuelPropertyJoiner::new(fuel_table())
        .join(&mut frame, "ON")
        .unwrap();

    assert_eq!(
        added,
        vec!["Cetane number", "Density at 15 °C, kg/m3", "Flash point, °C"]
    );
    assert_eq!(frame.column("Cetane number").unwrap(), &[Some(51.0); 4]);
    assert_eq!(frame.len(), 4);
}

#[test]
fn test_join_keeps_existing_columns() {
    let mut frame = stable_frame();
    FuelPropertyJoiner::new(fuel_table())
        .join(&mut frame, "HVO")
        .unwrap();
    assert_eq!(
        frame.column_names(),
        vec!["Obroty[obr/min]", "Cetane number"]
    );
    assert_eq!(frame.column("Cetane number").unwrap()[0], Some(70.0));
}

#[test]
fn test_join_unmatched_fuel_is_fatal() {
    let mut frame = stable_frame();
    let before = frame.clone();
    let err = FuelPropertyJoiner::new(fuel_table())
        .join(&mut frame, "RME")
        .unwrap_err();

    assert_eq!(err, AnalysisError::UnmatchedFuel("RME".to_string()));
    assert!(err.is_fatal());
    assert_eq!(frame, before);
}
