//! Fuel property reference data and the join onto processed runs.
//!
//! The reference table lists, per fuel short name, laboratory properties with
//! their units and specification limits. Joining broadcasts every property of
//! the run's fuel as a constant column.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::AnalysisError;
use crate::frame::Frame;

/// Unit marker for dimensionless properties
pub const NO_UNIT: &str = "-";

/// One property of a fuel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuelProperty {
    pub name: String,
    pub value: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_limit: Option<f64>,
}

impl FuelProperty {
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            lower_limit: None,
            upper_limit: None,
        }
    }

    /// Output column name: `"<name>, <unit>"`, or the bare name for
    /// dimensionless properties
    pub fn column_name(&self) -> String {
        if self.unit == NO_UNIT {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.unit)
        }
    }
}

/// Static reference record for one fuel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuelRecord {
    pub short_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub properties: Vec<FuelProperty>,
}

/// All known fuels
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuelTable {
    pub fuels: Vec<FuelRecord>,
}

impl FuelTable {
    pub fn new(fuels: Vec<FuelRecord>) -> Self {
        Self { fuels }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Load the reference table from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fuel table {}", path.display()))?;
        let table = Self::from_json(&content)
            .with_context(|| format!("Failed to parse fuel table {}", path.display()))?;
        tracing::info!("Loaded {} fuels from {}", table.fuels.len(), path.display());
        Ok(table)
    }

    pub fn find(&self, short_name: &str) -> Option<&FuelRecord> {
        self.fuels.iter().find(|f| f.short_name == short_name)
    }

    pub fn short_names(&self) -> Vec<&str> {
        self.fuels.iter().map(|f| f.short_name.as_str()).collect()
    }
}

/// Attaches fuel properties to processed runs
#[derive(Clone, Debug)]
pub struct FuelPropertyJoiner {
    pub table: FuelTable,
}

impl FuelPropertyJoiner {
    pub fn new(table: FuelTable) -> Self {
        Self { table }
    }

    /// Broadcast every property of `fuel` as a constant column.
    /// Returns the names of the added columns.
    pub fn join(&self, frame: &mut Frame, fuel: &str) -> Result<Vec<String>, AnalysisError> {
        let record = self.table.find(fuel).ok_or_else(|| {
            tracing::error!(
                "Fuel '{}' not found in fuel table (known: {})",
                fuel,
                self.table.short_names().join(", ")
            );
            AnalysisError::UnmatchedFuel(fuel.to_string())
        })?;

        let added: Vec<String> = record
            .properties
            .iter()
            .map(|property| {
                let column = property.column_name();
                frame.set_constant_column(column.clone(), property.value);
                column
            })
            .collect();

        tracing::info!(
            "Fuel properties for '{}' added: {}",
            fuel,
            added.join(", ")
        );
        Ok(added)
    }
}
