//! Tests for pipeline settings
//!
//! Tests cover:
//! - Default configuration
//! - Saving and loading JSON files
//! - Partial files and explicit channel pairs
//! - Validation

use diesel_stable::analysis::AnalysisError;
use diesel_stable::normalize::channels;
use diesel_stable::parsers::ChannelPair;
use diesel_stable::settings::{PipelineSettings, StabilityConfig};
use std::path::PathBuf;

// ============================================
// Default Tests
// ============================================

#[test]
fn test_default_stability_channels() {
    let settings = PipelineSettings::default();
    let names: Vec<&str> = settings
        .stability
        .iter()
        .map(|s| s.channel.as_str())
        .collect();
    assert_eq!(
        names,
        vec![channels::RPM, channels::TORQUE, channels::FUEL_CONSUMPTION]
    );
    assert!(settings.stability.iter().all(|s| s.window_ms == 8000.0));
    assert_eq!(settings.stability[1].threshold, 5.0);
    assert_eq!(settings.stability[2].threshold, 0.1);
}

#[test]
fn test_default_metadata_names() {
    let settings = PipelineSettings::default();
    assert_eq!(settings.pipeline_name, "data_pipeline");
    assert_eq!(settings.metadata_version, "v1.0");
    assert_eq!(settings.input_delimiter, ';');
    assert!(settings.channel_pairs.is_empty());
    assert!(settings.reference_channel.is_none());
}

#[test]
fn test_default_paths() {
    let settings = PipelineSettings::default();
    assert_eq!(settings.paths.raw_dir, PathBuf::from("data").join("raw"));
    assert_eq!(
        settings.paths.fuel_table_file,
        PathBuf::from("data").join("fuels").join("fuels.json")
    );
}

#[test]
fn test_config_dir_name() {
    if let Some(path) = PipelineSettings::get_settings_path() {
        assert!(path.ends_with("diesel-stable/settings.json"));
    }
}

// ============================================
// File Tests
// ============================================

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");

    let mut settings = PipelineSettings::default();
    settings.stability.push(StabilityConfig::new(channels::POWER, 1.0, 4000.0));
    settings.output.english_headers = true;
    settings.save(&path).unwrap();

    let loaded = PipelineSettings::load(&path).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_load_invalid_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = PipelineSettings::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse settings file"));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(PipelineSettings::load(&dir.path().join("missing.json")).is_err());
}

#[test]
fn test_explicit_channel_pairs() {
    let json = r#"{
        "channel_pairs": [
            { "time_column": "Czas [ms]", "value_column": "Obroty[obr/min]" },
            { "time_column": "Czas [ms].1", "value_column": "Moc[kW]" }
        ],
        "reference_channel": "Moc[kW]",
        "stability": [
            { "channel": "Obroty[obr/min]", "threshold": 10.0, "window_ms": 5000.0 },
            { "channel": "Moc[kW]", "threshold": 0.5, "window_ms": 5000.0 }
        ]
    }"#;
    let settings: PipelineSettings = serde_json::from_str(json).unwrap();

    assert_eq!(
        settings.channel_pairs[1],
        ChannelPair::new("Czas [ms].1", "Moc[kW]")
    );
    assert_eq!(settings.reference_channel.as_deref(), Some("Moc[kW]"));
    assert_eq!(settings.stability[0].threshold, 10.0);
    assert_eq!(settings.value_channels.len(), 17);
    assert!(settings.validate().is_ok());
}

// ============================================
// Validation Tests
// ============================================

#[test]
fn test_validate_negative_threshold() {
    let mut settings = PipelineSettings::default();
    settings.stability[0].threshold = -1.0;
    assert!(matches!(
        settings.validate(),
        Err(AnalysisError::InvalidParameter(_))
    ));
}

#[test]
fn test_validate_zero_threshold_allowed() {
    let mut settings = PipelineSettings::default();
    settings.stability[0].threshold = 0.0;
    assert!(settings.validate().is_ok());
}
