//! Pipeline configuration.
//!
//! Every component receives its parameters from these structs instead of
//! module-level constants. Settings are stored as JSON; every field has a
//! default so partial files are accepted.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::AnalysisError;
use crate::normalize::channels;
use crate::parsers::ChannelPair;

/// Environment variable that points at a settings file
pub const CONFIG_ENV_VAR: &str = "DIESEL_STABLE_CONFIG";

/// Stability criterion for one channel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StabilityConfig {
    /// Value column to monitor
    pub channel: String,
    /// Maximum allowed rolling range (max - min)
    pub threshold: f64,
    /// Rolling window length in milliseconds
    pub window_ms: f64,
}

impl StabilityConfig {
    pub fn new(channel: impl Into<String>, threshold: f64, window_ms: f64) -> Self {
        Self {
            channel: channel.into(),
            threshold,
            window_ms,
        }
    }
}

/// Oil-temperature gate used to exclude cold-start transients
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OilGateConfig {
    pub channel: String,
    /// Minimum oil temperature in °C
    pub min_temperature: f64,
}

impl Default for OilGateConfig {
    fn default() -> Self {
        Self {
            channel: channels::OIL_TEMP.to_string(),
            min_temperature: 50.0,
        }
    }
}

/// Atmospheric power/torque correction parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    /// Engine displacement in liters
    pub displacement_l: f64,
    /// Fuel delivery scaling constant
    pub z: f64,
    /// Log average/maximum change of power and torque after correction
    pub report_corrections: bool,
    pub fuel_flow_column: String,
    pub rpm_column: String,
    pub boost_pressure_column: String,
    pub atmospheric_pressure_column: String,
    pub ambient_temperature_column: String,
    pub humidity_column: String,
    pub power_column: String,
    pub torque_column: String,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            displacement_l: 4.5,
            z: 120_000.0,
            report_corrections: true,
            fuel_flow_column: channels::FUEL_CONSUMPTION.to_string(),
            rpm_column: channels::RPM.to_string(),
            boost_pressure_column: channels::TURBO_PRESSURE.to_string(),
            atmospheric_pressure_column: channels::ATMOSPHERIC_PRESSURE.to_string(),
            ambient_temperature_column: channels::AMBIENT_TEMP.to_string(),
            humidity_column: channels::HUMIDITY.to_string(),
            power_column: channels::POWER.to_string(),
            torque_column: channels::TORQUE.to_string(),
        }
    }
}

/// Multi-probe exhaust temperature averaging
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExhaustConfig {
    pub probes: Vec<String>,
    pub output_column: String,
}

impl Default for ExhaustConfig {
    fn default() -> Self {
        Self {
            probes: [
                channels::EXHAUST_TEMP_1,
                channels::EXHAUST_TEMP_2,
                channels::EXHAUST_TEMP_3,
                channels::EXHAUST_TEMP_4,
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            output_column: channels::EXHAUST_TEMP_MEAN.to_string(),
        }
    }
}

/// Output table options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Rename known columns to short English names
    pub english_headers: bool,
    pub delimiter: char,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            english_headers: false,
            delimiter: ',',
        }
    }
}

impl OutputConfig {
    /// Delimiter as a single byte, falling back to `,` for non-ASCII characters
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            b','
        }
    }
}

/// Data locations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub raw_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub metadata_dir: PathBuf,
    pub catalog_file: PathBuf,
    pub fuel_table_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let data = PathBuf::from("data");
        Self {
            raw_dir: data.join("raw"),
            processed_dir: data.join("processed"),
            metadata_dir: data.join("metadata"),
            catalog_file: data.join("catalog.json"),
            fuel_table_file: data.join("fuels").join("fuels.json"),
        }
    }
}

/// Complete pipeline configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Settings file version for migration support
    pub version: u32,
    /// Name recorded in the metadata store
    pub pipeline_name: String,
    /// Version suffix of the metadata file
    pub metadata_version: String,
    /// Input CSV delimiter
    pub input_delimiter: char,
    /// Value columns to keep
    pub value_channels: Vec<String>,
    /// Explicit (time, value) pairs; resolved from the header when empty
    pub channel_pairs: Vec<ChannelPair>,
    /// Value column whose time column is the reference axis.
    /// Defaults to the first resolved pair.
    pub reference_channel: Option<String>,
    pub stability: Vec<StabilityConfig>,
    pub oil_gate: OilGateConfig,
    pub correction: CorrectionConfig,
    pub exhaust: ExhaustConfig,
    pub output: OutputConfig,
    pub paths: PathsConfig,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            version: 1,
            pipeline_name: "data_pipeline".to_string(),
            metadata_version: "v1.0".to_string(),
            input_delimiter: ';',
            value_channels: channels::VALUE_CHANNELS.iter().map(|s| s.to_string()).collect(),
            channel_pairs: Vec::new(),
            reference_channel: None,
            stability: vec![
                StabilityConfig::new(channels::RPM, 20.0, 8000.0),
                StabilityConfig::new(channels::TORQUE, 5.0, 8000.0),
                StabilityConfig::new(channels::FUEL_CONSUMPTION, 0.1, 8000.0),
            ],
            oil_gate: OilGateConfig::default(),
            correction: CorrectionConfig::default(),
            exhaust: ExhaustConfig::default(),
            output: OutputConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl PipelineSettings {
    /// Get the config directory path
    pub fn get_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("diesel-stable"))
    }

    /// Get the path to the default settings JSON file
    pub fn get_settings_path() -> Option<PathBuf> {
        Self::get_config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        Ok(settings)
    }

    /// Load settings from `DIESEL_STABLE_CONFIG`, then the user config
    /// directory, falling back to defaults when neither exists
    pub fn load_or_default() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load(Path::new(&path));
        }

        match Self::get_settings_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                tracing::debug!("No settings file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory {}", parent.display())
                })?;
            }
        }

        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings file {}", path.display()))?;
        Ok(())
    }

    /// Reject configurations no component can run with
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.stability.len() < 2 {
            return Err(AnalysisError::InvalidParameter(format!(
                "at least two stability channels are required, got {}",
                self.stability.len()
            )));
        }

        for cfg in &self.stability {
            if !(cfg.window_ms > 0.0) {
                return Err(AnalysisError::InvalidParameter(format!(
                    "window for '{}' must be positive, got {}",
                    cfg.channel, cfg.window_ms
                )));
            }
            if !(cfg.threshold >= 0.0) {
                return Err(AnalysisError::InvalidParameter(format!(
                    "threshold for '{}' must be non-negative, got {}",
                    cfg.channel, cfg.threshold
                )));
            }
        }

        if !(self.correction.displacement_l > 0.0) {
            return Err(AnalysisError::InvalidParameter(format!(
                "displacement must be positive, got {}",
                self.correction.displacement_l
            )));
        }

        Ok(())
    }
}
