//! Run processing: load, synchronize, filter, correct, join, export.
//!
//! Every run ends in a [`RunOutcome`]. Recoverable conditions skip the run,
//! fatal ones fail it, and nothing escapes the batch loop. Output files are
//! written only after every stage has succeeded.

use rayon::prelude::*;
use serde_json::json;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::analysis::correction::{AtmosphericCorrector, CorrectionSummary, ExhaustAverager};
use crate::analysis::intersect::IntervalIntersector;
use crate::analysis::stability::{
    OilTemperatureGate, StabilityDetector, StabilityResult, StableTimeFilter,
};
use crate::analysis::sync::TimeSynchronizer;
use crate::analysis::AnalysisError;
use crate::catalog::{Catalog, CatalogEntry};
use crate::export::{output_file_name, write_csv};
use crate::frame::Frame;
use crate::fuels::{FuelPropertyJoiner, FuelTable};
use crate::observer::{PipelineObserver, PipelineStep, RunState, RunStatus};
use crate::parsers::{load_file, ChannelPair, RawRun, RawTable};
use crate::settings::PipelineSettings;
use crate::validator::DataValidator;

/// Tagged result of processing one run
#[derive(Clone, Debug, PartialEq)]
pub enum RunOutcome {
    Completed { rows: usize, output: Option<PathBuf> },
    /// Recoverable: no stable period, missing channel
    Skipped(AnalysisError),
    /// Fatal for the run: unmatched fuel, unusable time axis
    Failed(AnalysisError),
    /// Input could not be read or output could not be written
    IoError(String),
}

impl RunOutcome {
    /// Classify an analysis error
    pub fn from_error(err: AnalysisError) -> Self {
        if err.is_fatal() {
            RunOutcome::Failed(err)
        } else {
            RunOutcome::Skipped(err)
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    pub fn state(&self) -> RunState {
        match self {
            RunOutcome::Completed { .. } => RunState::Completed,
            RunOutcome::Skipped(_) => RunState::Skipped,
            RunOutcome::Failed(_) | RunOutcome::IoError(_) => RunState::Failed,
        }
    }

    pub fn status(&self) -> RunStatus {
        let (reason, rows, output) = match self {
            RunOutcome::Completed { rows, output } => (
                None,
                Some(*rows),
                output.as_ref().map(|p| p.display().to_string()),
            ),
            RunOutcome::Skipped(e) | RunOutcome::Failed(e) => (Some(e.to_string()), None, None),
            RunOutcome::IoError(msg) => (Some(msg.clone()), None, None),
        };
        RunStatus {
            state: self.state(),
            reason,
            rows,
            output,
        }
    }
}

/// Everything produced for a successfully processed run
#[derive(Clone, Debug)]
pub struct ProcessedRun {
    pub frame: Frame,
    /// Rows on the synchronized axis
    pub synchronized_rows: usize,
    pub stability: Vec<StabilityResult>,
    pub correction: Option<CorrectionSummary>,
    pub fuel_columns: Vec<String>,
}

/// Status line of one run in a batch
#[derive(Clone, Debug, PartialEq)]
pub struct BatchEntry {
    pub id: u32,
    pub source: String,
    pub fuel: String,
    pub outcome: RunOutcome,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn count(&self, state: RunState) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome.state() == state)
            .count()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let status = entry.outcome.status();
            write!(f, "[{:>3}] {:<9} {} ({})", entry.id, status.state, entry.source, entry.fuel)?;
            match (&status.reason, status.rows) {
                (Some(reason), _) => writeln!(f, ": {}", reason)?,
                (None, Some(rows)) => writeln!(f, ": {} rows", rows)?,
                (None, None) => writeln!(f)?,
            }
        }
        write!(
            f,
            "{} completed, {} skipped, {} failed",
            self.count(RunState::Completed),
            self.count(RunState::Skipped),
            self.count(RunState::Failed)
        )
    }
}

/// Stable-period extraction pipeline
pub struct Pipeline {
    settings: PipelineSettings,
    filters: Vec<Box<dyn StableTimeFilter>>,
    corrector: AtmosphericCorrector,
    averager: ExhaustAverager,
    joiner: FuelPropertyJoiner,
    observer: Arc<dyn PipelineObserver>,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        fuels: FuelTable,
        observer: Arc<dyn PipelineObserver>,
    ) -> Result<Self, AnalysisError> {
        settings.validate()?;

        let mut filters: Vec<Box<dyn StableTimeFilter>> = settings
            .stability
            .iter()
            .map(|cfg| Box::new(StabilityDetector::from(cfg)) as Box<dyn StableTimeFilter>)
            .collect();
        filters.push(Box::new(OilTemperatureGate::from(&settings.oil_gate)));

        Ok(Self {
            corrector: AtmosphericCorrector::new(settings.correction.clone()),
            averager: ExhaustAverager::new(settings.exhaust.clone()),
            joiner: FuelPropertyJoiner::new(fuels),
            filters,
            settings,
            observer,
        })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Filters applied to every run, stability detectors first
    pub fn filters(&self) -> &[Box<dyn StableTimeFilter>] {
        &self.filters
    }

    /// Configured pairs, or pairs resolved from the header
    pub fn resolve_pairs(&self, table: &RawTable) -> Vec<ChannelPair> {
        if self.settings.channel_pairs.is_empty() {
            table.pair_channels(&self.settings.value_channels)
        } else {
            self.settings.channel_pairs.clone()
        }
    }

    /// Read a catalog entry's main bench file
    pub fn load_run(&self, entry: &CatalogEntry) -> anyhow::Result<RawRun> {
        let path = entry
            .main_path(&self.settings.paths.raw_dir)
            .ok_or_else(|| anyhow::anyhow!("Catalog entry {} has no main file", entry.id))?;
        let delimiter = if self.settings.input_delimiter.is_ascii() {
            self.settings.input_delimiter as u8
        } else {
            b';'
        };
        let table = load_file(&path, delimiter)
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
        let pairs = self.resolve_pairs(&table);

        Ok(RawRun {
            id: entry.id,
            source: entry.main_file_name.clone(),
            fuel: entry.fuel.clone(),
            test_type: entry.diesel_test_type.clone(),
            table,
            pairs,
        })
    }

    /// Load several entries in parallel. Results keep the input order.
    pub fn load_runs(&self, entries: &[CatalogEntry]) -> Vec<anyhow::Result<RawRun>> {
        entries.par_iter().map(|entry| self.load_run(entry)).collect()
    }

    /// Run every stage on one run
    pub fn process(&self, run: &RawRun) -> Result<ProcessedRun, AnalysisError> {
        let key = run.key();
        tracing::info!("Processing run {}", key);

        // Validation
        let report = DataValidator::from_settings(&self.settings).validate(
            &run.source,
            &run.table,
            &run.pairs,
        );
        self.observer.on_step(
            &key,
            PipelineStep::Validate,
            serde_json::to_value(&report).unwrap_or_default(),
        );

        // Synchronization
        let synchronizer =
            TimeSynchronizer::for_pairs(&run.pairs, self.settings.reference_channel.as_deref())?;
        let synced = synchronizer.synchronize(&run.table, &run.pairs)?;
        self.observer.on_step(
            &key,
            PipelineStep::Synchronize,
            json!({
                "reference_time_column": synchronizer.reference_time_column,
                "rows": synced.frame.len(),
                "tolerance_ms": synced.tolerance_ms,
                "missing_channels": synced.missing_channels,
            }),
        );
        let frame = synced.frame;

        // Per-channel stability
        let mut stability = Vec::with_capacity(self.filters.len());
        for filter in &self.filters {
            let result = filter.detect(&frame)?;
            self.observer.on_step(
                &key,
                PipelineStep::DetectStability,
                json!({
                    "filter": filter.id(),
                    "channel": result.channel,
                    "intervals": result.intervals.len(),
                    "stable_rows": result.stable_count(),
                    "interval_means": result.intervals.iter().map(|i| i.mean).collect::<Vec<_>>(),
                    "metadata": result.metadata,
                }),
            );
            if result.intervals.is_empty() {
                return Err(AnalysisError::NoStablePeriod(format!(
                    "no stable intervals for '{}'",
                    result.channel
                )));
            }
            stability.push(result);
        }

        // Intersection
        let mut stable = IntervalIntersector.extract_results(&frame, &stability)?;
        self.observer.on_step(
            &key,
            PipelineStep::Intersect,
            json!({ "rows_before": frame.len(), "rows_after": stable.len() }),
        );
        if stable.is_empty() {
            return Err(AnalysisError::NoStablePeriod(
                "intersection of stable sets is empty".to_string(),
            ));
        }

        // Corrections are best effort: missing inputs leave the frame as is
        let correction = match self.corrector.apply(&mut stable) {
            Ok(summary) => {
                self.observer.on_step(
                    &key,
                    PipelineStep::AtmosphericCorrection,
                    serde_json::to_value(&summary).unwrap_or_default(),
                );
                Some(summary)
            }
            Err(AnalysisError::MissingColumn(columns)) => {
                self.observer.on_step(
                    &key,
                    PipelineStep::AtmosphericCorrection,
                    json!({ "skipped": true, "missing": columns }),
                );
                None
            }
            Err(e) => return Err(e),
        };

        match self.averager.apply(&mut stable) {
            Ok(()) => self.observer.on_step(
                &key,
                PipelineStep::ExhaustAveraging,
                json!({ "probes": self.settings.exhaust.probes, "output": self.settings.exhaust.output_column }),
            ),
            Err(AnalysisError::MissingColumn(columns)) => self.observer.on_step(
                &key,
                PipelineStep::ExhaustAveraging,
                json!({ "skipped": true, "missing": columns }),
            ),
            Err(e) => return Err(e),
        }

        // Fuel properties
        let fuel_columns = self.joiner.join(&mut stable, &run.fuel)?;
        self.observer.on_step(
            &key,
            PipelineStep::FuelJoin,
            json!({ "fuel": run.fuel, "columns": fuel_columns }),
        );

        tracing::info!(
            "Run {} kept {} of {} rows",
            key,
            stable.len(),
            frame.len()
        );

        Ok(ProcessedRun {
            synchronized_rows: frame.len(),
            frame: stable,
            stability,
            correction,
            fuel_columns,
        })
    }

    /// Process one run and classify the result. Nothing is written.
    pub fn process_run(&self, run: &RawRun) -> (RunOutcome, Option<Frame>) {
        match self.process(run) {
            Ok(processed) => (
                RunOutcome::Completed {
                    rows: processed.frame.len(),
                    output: None,
                },
                Some(processed.frame),
            ),
            Err(err) => {
                if err.is_fatal() {
                    tracing::error!("Run {} failed: {}", run.key(), err);
                } else {
                    tracing::warn!("Run {} skipped: {}", run.key(), err);
                }
                (RunOutcome::from_error(err), None)
            }
        }
    }

    /// Process one run and write its output into the processed directory
    pub fn run_and_export(&self, run: &RawRun) -> RunOutcome {
        let outcome = match self.process_run(run) {
            (RunOutcome::Completed { rows, .. }, Some(frame)) => {
                let path = self
                    .settings
                    .paths
                    .processed_dir
                    .join(output_file_name(&run.source));
                match write_csv(&frame, &path, &self.settings.output) {
                    Ok(path) => {
                        self.observer.on_step(
                            &run.key(),
                            PipelineStep::Export,
                            json!({ "path": path.display().to_string(), "rows": rows }),
                        );
                        RunOutcome::Completed {
                            rows,
                            output: Some(path),
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to write {}: {:#}", path.display(), e);
                        RunOutcome::IoError(format!("{:#}", e))
                    }
                }
            }
            (outcome, _) => outcome,
        };

        self.observer.on_outcome(&run.key(), &outcome.status());
        outcome
    }

    /// Process catalog entries. An empty `ids` list selects every entry.
    pub fn run_batch(&self, catalog: &Catalog, ids: &[u32]) -> BatchReport {
        let entries: Vec<CatalogEntry> = if ids.is_empty() {
            catalog.entries().into_iter().cloned().collect()
        } else {
            ids.iter()
                .filter_map(|id| {
                    let entry = catalog.find(*id).cloned();
                    if entry.is_none() {
                        tracing::warn!("Catalog has no entry with id {}", id);
                    }
                    entry
                })
                .collect()
        };

        tracing::info!("Loading {} runs", entries.len());
        let loaded = self.load_runs(&entries);

        let mut report = BatchReport::default();
        for (entry, run) in entries.into_iter().zip(loaded) {
            let outcome = match run {
                Ok(run) => {
                    self.observer.on_step(
                        &run.key(),
                        PipelineStep::Load,
                        json!({
                            "source": run.source,
                            "rows": run.table.row_count(),
                            "columns": run.table.columns.len(),
                            "pairs": run.pairs.len(),
                        }),
                    );
                    self.run_and_export(&run)
                }
                Err(e) => {
                    tracing::error!("Failed to load entry {}: {:#}", entry.id, e);
                    let outcome = RunOutcome::IoError(format!("{:#}", e));
                    let key = format!("{}:{}:{}", entry.id, entry.main_file_name, entry.fuel);
                    self.observer.on_outcome(&key, &outcome.status());
                    outcome
                }
            };

            report.entries.push(BatchEntry {
                id: entry.id,
                source: entry.main_file_name,
                fuel: entry.fuel,
                outcome,
            });
        }

        tracing::info!(
            "Batch finished: {} completed, {} skipped, {} failed",
            report.count(RunState::Completed),
            report.count(RunState::Skipped),
            report.count(RunState::Failed)
        );
        report
    }
}
