//! Versioned metadata side-store.
//!
//! Collects step details and final statuses for every processed run and
//! writes them to `metadata_<version>.json`. Records are keyed by run key;
//! reporting a status for a key that already has one replaces it.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::observer::{PipelineObserver, PipelineStep, RunStatus};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: PipelineStep,
    pub timestamp: DateTime<Utc>,
    pub details: serde_json::Value,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub steps: Vec<StepRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
}

/// Document written to disk
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    pub pipeline_name: String,
    pub version: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub runs: BTreeMap<String, RunRecord>,
}

/// Thread-safe metadata collector
#[derive(Debug)]
pub struct MetadataStore {
    dir: PathBuf,
    document: Mutex<MetadataDocument>,
}

impl MetadataStore {
    pub fn new(dir: impl Into<PathBuf>, pipeline_name: &str, version: &str) -> Self {
        Self {
            dir: dir.into(),
            document: Mutex::new(MetadataDocument {
                pipeline_name: pipeline_name.to_string(),
                version: version.to_string(),
                start_time: Utc::now(),
                end_time: None,
                runs: BTreeMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetadataDocument> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Path of the metadata file
    pub fn file_path(&self) -> PathBuf {
        let version = self.lock().version.clone();
        self.dir.join(format!("metadata_{}.json", version))
    }

    /// Copy of the current document
    pub fn snapshot(&self) -> MetadataDocument {
        self.lock().clone()
    }

    pub fn run(&self, run_key: &str) -> Option<RunRecord> {
        self.lock().runs.get(run_key).cloned()
    }

    /// Stamp the end time
    pub fn finalize(&self) {
        self.lock().end_time = Some(Utc::now());
    }

    /// Write the document as pretty JSON. The file is replaced atomically.
    pub fn save(&self) -> Result<PathBuf> {
        let path = self.file_path();
        let content = serde_json::to_string_pretty(&*self.lock())
            .context("Failed to serialize metadata")?;
        write_atomic(&path, content.as_bytes())?;
        tracing::info!("Metadata saved to {}", path.display());
        Ok(path)
    }

    /// Read a previously saved document
    pub fn load_document(path: &Path) -> Result<MetadataDocument> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read metadata {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse metadata {}", path.display()))
    }
}

impl PipelineObserver for MetadataStore {
    fn on_step(&self, run_key: &str, step: PipelineStep, details: serde_json::Value) {
        tracing::debug!("Metadata updated for {} step {}", run_key, step);
        self.lock()
            .runs
            .entry(run_key.to_string())
            .or_default()
            .steps
            .push(StepRecord {
                step,
                timestamp: Utc::now(),
                details,
            });
    }

    fn on_outcome(&self, run_key: &str, status: &RunStatus) {
        self.lock()
            .runs
            .entry(run_key.to_string())
            .or_default()
            .status = Some(status.clone());
    }
}

/// Write `bytes` to a sibling temp file and rename it over `path`
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let tmp = temp_path(path);
    std::fs::write(&tmp, bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move {} into place", path.display()))?;
    Ok(())
}

/// `<path>.tmp` next to the target
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
