//! Physical corrections applied to stable-period rows.
//!
//! Two stateless transformations:
//!
//! - [`AtmosphericCorrector`] scales power and torque to reference
//!   atmospheric conditions and drops the consumed atmospheric columns
//! - [`ExhaustAverager`] collapses per-probe exhaust temperatures into one
//!   row-wise mean column
//!
//! Both check their inputs before touching the frame, so a missing or
//! all-null column leaves the frame exactly as it was.

use serde::Serialize;

use super::statistics::compute_descriptive_stats;
use super::statistics::percent_changes;
use super::*;
use crate::settings::{CorrectionConfig, ExhaustConfig};

// ============================================================================
// Atmospheric power/torque correction
// ============================================================================

/// Lower `qc` bound below which `fm` is fixed at 0.2
pub const QC_LOWER: f64 = 37.2;
/// Upper `qc` bound above which `fm` is fixed at 1.2
pub const QC_UPPER: f64 = 65.0;

/// Engine factor `fm` as a function of the corrected fuel delivery `qc`
pub fn engine_factor(qc: f64) -> f64 {
    if qc <= QC_LOWER {
        0.2
    } else if qc >= QC_UPPER {
        1.2
    } else {
        0.036 * qc - 1.14
    }
}

/// Atmospheric factor `fa` from atmospheric pressure (hPa) and ambient
/// temperature (°C)
pub fn atmospheric_factor(pa_hpa: f64, ta_c: f64) -> f64 {
    (99.0 / (pa_hpa / 10.0)).powf(0.7) * ((ta_c + 273.15) / 298.15).powf(1.2)
}

/// Inputs of the correction for one row
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrectionInputs {
    /// Fuel flow in g/s
    pub fuel_flow: f64,
    /// Engine speed in rpm
    pub rpm: f64,
    /// Boost pressure after the turbocharger
    pub boost_pressure: f64,
    /// Atmospheric pressure in hPa
    pub atmospheric_pressure: f64,
    /// Ambient temperature in °C
    pub ambient_temperature: f64,
}

/// Correction factor `ac = fa ^ fm`. `None` when the inputs do not give a
/// finite factor (zero speed or pressure).
pub fn correction_factor(inputs: &CorrectionInputs, displacement_l: f64, z: f64) -> Option<f64> {
    let q = z * inputs.fuel_flow / (displacement_l * inputs.rpm);
    let r = (inputs.boost_pressure / 10.0) / inputs.atmospheric_pressure;
    let qc = q / r;
    let fm = engine_factor(qc);
    let fa = atmospheric_factor(inputs.atmospheric_pressure, inputs.ambient_temperature);
    let ac = fa.powf(fm);
    ac.is_finite().then_some(ac)
}

/// How much the correction moved power and torque, in percent
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CorrectionSummary {
    pub rows: usize,
    /// Rows that received a finite correction factor
    pub corrected_rows: usize,
    pub avg_power_change_pct: Option<f64>,
    pub max_power_change_pct: Option<f64>,
    pub avg_torque_change_pct: Option<f64>,
    pub max_torque_change_pct: Option<f64>,
}

/// Atmospheric power/torque correction
#[derive(Clone, Debug, Default)]
pub struct AtmosphericCorrector {
    pub config: CorrectionConfig,
}

impl AtmosphericCorrector {
    pub fn new(config: CorrectionConfig) -> Self {
        Self { config }
    }

    /// Correct power and torque in place and drop the atmospheric columns.
    ///
    /// A null in any input gives a null corrected value for that row. When an
    /// input column is absent or entirely null the frame is left untouched
    /// and `MissingColumn` is returned.
    pub fn apply(&self, frame: &mut Frame) -> Result<CorrectionSummary, AnalysisError> {
        let c = &self.config;
        let mut missing = Vec::new();
        let fuel = usable_column(frame, &c.fuel_flow_column, &mut missing);
        let rpm = usable_column(frame, &c.rpm_column, &mut missing);
        let boost = usable_column(frame, &c.boost_pressure_column, &mut missing);
        let pa = usable_column(frame, &c.atmospheric_pressure_column, &mut missing);
        let ta = usable_column(frame, &c.ambient_temperature_column, &mut missing);
        let power = usable_column(frame, &c.power_column, &mut missing);
        let torque = usable_column(frame, &c.torque_column, &mut missing);
        if !missing.is_empty() {
            tracing::error!(
                "Missing columns for atmospheric power correction: {:?}",
                missing
            );
            return Err(AnalysisError::MissingColumn(missing.join(", ")));
        }

        let factors: Vec<Option<f64>> = (0..frame.len())
            .map(|i| {
                let inputs = CorrectionInputs {
                    fuel_flow: fuel[i]?,
                    rpm: rpm[i]?,
                    boost_pressure: boost[i]?,
                    atmospheric_pressure: pa[i]?,
                    ambient_temperature: ta[i]?,
                };
                correction_factor(&inputs, c.displacement_l, c.z)
            })
            .collect();

        let scale = |raw: &[Option<f64>]| -> Vec<Option<f64>> {
            raw.iter()
                .zip(&factors)
                .map(|(v, ac)| Some((*v)? * (*ac)?))
                .collect()
        };
        let corrected_power = scale(power);
        let corrected_torque = scale(torque);

        let power_changes = percent_changes(power, &corrected_power);
        let torque_changes = percent_changes(torque, &corrected_torque);
        let power_stats = compute_descriptive_stats(&power_changes);
        let torque_stats = compute_descriptive_stats(&torque_changes);

        let summary = CorrectionSummary {
            rows: frame.len(),
            corrected_rows: factors.iter().filter(|f| f.is_some()).count(),
            avg_power_change_pct: power_stats.as_ref().map(|s| s.mean),
            max_power_change_pct: power_stats.as_ref().map(|s| s.max),
            avg_torque_change_pct: torque_stats.as_ref().map(|s| s.mean),
            max_torque_change_pct: torque_stats.as_ref().map(|s| s.max),
        };

        if c.report_corrections {
            tracing::info!(
                "Average power correction: {:.2}%",
                summary.avg_power_change_pct.unwrap_or(f64::NAN)
            );
            tracing::info!(
                "Maximum power correction: {:.2}%",
                summary.max_power_change_pct.unwrap_or(f64::NAN)
            );
            tracing::info!(
                "Average torque correction: {:.2}%",
                summary.avg_torque_change_pct.unwrap_or(f64::NAN)
            );
            tracing::info!(
                "Maximum torque correction: {:.2}%",
                summary.max_torque_change_pct.unwrap_or(f64::NAN)
            );
        }

        frame.set_column(c.power_column.clone(), corrected_power);
        frame.set_column(c.torque_column.clone(), corrected_torque);

        frame.drop_column(&c.atmospheric_pressure_column);
        frame.drop_column(&c.ambient_temperature_column);
        frame.drop_column(&c.humidity_column);

        tracing::info!(
            "Atmospheric power correction applied to {} of {} rows",
            summary.corrected_rows,
            summary.rows
        );

        Ok(summary)
    }
}

// ============================================================================
// Exhaust temperature averaging
// ============================================================================

/// Replaces per-probe exhaust temperatures with their row-wise mean
#[derive(Clone, Debug, Default)]
pub struct ExhaustAverager {
    pub config: ExhaustConfig,
}

impl ExhaustAverager {
    pub fn new(config: ExhaustConfig) -> Self {
        Self { config }
    }

    /// Add the mean column and drop the probe columns. Nulls are skipped; a
    /// row with every probe null gets a null mean.
    pub fn apply(&self, frame: &mut Frame) -> Result<(), AnalysisError> {
        if self.config.probes.is_empty() {
            return Err(AnalysisError::InvalidParameter(
                "no exhaust probes configured".to_string(),
            ));
        }

        let mut missing = Vec::new();
        let mut columns: Vec<&[Option<f64>]> = Vec::with_capacity(self.config.probes.len());
        for probe in &self.config.probes {
            columns.push(usable_column(frame, probe, &mut missing));
        }
        if !missing.is_empty() {
            tracing::error!("Missing columns for exhaust temperature mean: {:?}", missing);
            return Err(AnalysisError::MissingColumn(missing.join(", ")));
        }

        let means: Vec<Option<f64>> = (0..frame.len())
            .map(|row| {
                let (sum, count) = columns
                    .iter()
                    .filter_map(|col| col[row])
                    .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                (count > 0).then(|| sum / count as f64)
            })
            .collect();

        for probe in &self.config.probes {
            frame.drop_column(probe);
        }
        frame.set_column(self.config.output_column.clone(), means);

        tracing::info!(
            "Averaged {} exhaust probes into '{}'",
            self.config.probes.len(),
            self.config.output_column
        );
        Ok(())
    }
}
