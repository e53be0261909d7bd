//! Optional observer for pipeline progress.
//!
//! Components never check whether something is listening: the pipeline always
//! holds an observer, and [`NoopObserver`] is used when nothing needs to be
//! recorded.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};

/// Pipeline steps reported to observers, in execution order
#[derive(
    AsRefStr, Clone, Copy, Debug, Display, EnumIter, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineStep {
    Load,
    Validate,
    Synchronize,
    DetectStability,
    Intersect,
    AtmosphericCorrection,
    ExhaustAveraging,
    FuelJoin,
    Export,
}

/// Final state of one run
#[derive(AsRefStr, Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    Completed,
    Skipped,
    Failed,
}

/// Status line recorded for a run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub state: RunState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Receives step and outcome notifications. Every method has a no-op default.
pub trait PipelineObserver: Send + Sync {
    fn on_step(&self, _run_key: &str, _step: PipelineStep, _details: serde_json::Value) {}

    fn on_outcome(&self, _run_key: &str, _status: &RunStatus) {}
}

/// Observer that records nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}
