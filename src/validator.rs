//! Column validation for raw bench tables.
//!
//! Validation is diagnostic: it reports what is missing or unusable but does
//! not stop a run. The stages decide themselves how to handle a missing
//! channel.

use serde::Serialize;
use std::fmt;

use crate::parsers::{ChannelPair, RawTable};
use crate::settings::PipelineSettings;

/// Result of validating one raw table
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub source: String,
    pub row_count: usize,
    pub column_count: usize,
    pub missing_required: Vec<String>,
    pub missing_optional: Vec<String>,
    /// Columns present but without a single value
    pub empty_columns: Vec<String>,
    /// Value columns that appeared more than once in the header
    pub duplicate_columns: Vec<String>,
    pub pairs: Vec<ChannelPair>,
}

impl ValidationReport {
    /// True when every required column is present
    pub fn is_valid(&self) -> bool {
        self.missing_required.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation report for {}", self.source)?;
        writeln!(
            f,
            "  {} rows, {} columns, {} channel pairs",
            self.row_count,
            self.column_count,
            self.pairs.len()
        )?;
        if self.is_valid() {
            writeln!(f, "  All required columns present")?;
        } else {
            writeln!(f, "  Missing required: {}", self.missing_required.join(", "))?;
        }
        if !self.missing_optional.is_empty() {
            writeln!(f, "  Missing optional: {}", self.missing_optional.join(", "))?;
        }
        if !self.empty_columns.is_empty() {
            writeln!(f, "  Empty columns: {}", self.empty_columns.join(", "))?;
        }
        if !self.duplicate_columns.is_empty() {
            writeln!(f, "  Duplicate columns: {}", self.duplicate_columns.join(", "))?;
        }
        Ok(())
    }
}

/// Checks raw tables against required and optional column lists
#[derive(Clone, Debug, Default)]
pub struct DataValidator {
    pub required: Vec<String>,
    pub optional: Vec<String>,
    /// Prefix of the per-channel time columns
    pub time_prefix: String,
}

impl DataValidator {
    pub fn new(required: Vec<String>, optional: Vec<String>) -> Self {
        Self {
            required,
            optional,
            time_prefix: "Czas".to_string(),
        }
    }

    /// Stability and gate channels are required; the remaining value
    /// channels are optional
    pub fn from_settings(settings: &PipelineSettings) -> Self {
        let mut required: Vec<String> = settings
            .stability
            .iter()
            .map(|s| s.channel.clone())
            .collect();
        required.push(settings.oil_gate.channel.clone());
        required.dedup();

        let optional = settings
            .value_channels
            .iter()
            .filter(|c| !required.contains(c))
            .cloned()
            .collect();

        Self::new(required, optional)
    }

    pub fn validate(&self, source: &str, table: &RawTable, pairs: &[ChannelPair]) -> ValidationReport {
        let missing = |names: &[String]| -> Vec<String> {
            names
                .iter()
                .filter(|n| !table.has_column(n))
                .cloned()
                .collect()
        };

        let empty_columns = table
            .columns
            .iter()
            .filter(|c| c.non_null_count() == 0)
            .map(|c| c.name.clone())
            .collect();

        let duplicate_columns = table
            .columns
            .iter()
            .filter(|c| !c.name.starts_with(&self.time_prefix))
            .filter_map(|c| {
                let (base, suffix) = c.name.rsplit_once('.')?;
                let numbered = !suffix.is_empty() && suffix.chars().all(|ch| ch.is_ascii_digit());
                (numbered && table.has_column(base)).then(|| base.to_string())
            })
            .collect();

        let report = ValidationReport {
            source: source.to_string(),
            row_count: table.row_count(),
            column_count: table.columns.len(),
            missing_required: missing(&self.required),
            missing_optional: missing(&self.optional),
            empty_columns,
            duplicate_columns,
            pairs: pairs.to_vec(),
        };

        if report.is_valid() {
            tracing::info!("{}: all required columns present", source);
        } else {
            tracing::warn!(
                "{}: missing required columns: {:?}",
                source,
                report.missing_required
            );
        }
        if !report.missing_optional.is_empty() {
            tracing::debug!("{}: missing optional columns: {:?}", source, report.missing_optional);
        }

        report
    }
}
