//! Run catalog: maps run ids to bench files and their metadata.
//!
//! The catalog is a JSON document grouping entries by test campaign:
//!
//! ```json
//! { "Lublin Diesel": [ { "id": 1, "main_file_name": "...", "fuel": "ON", ... } ] }
//! ```
//!
//! [`CatalogBuilder`] creates it from a directory listing by reading the test
//! date, fuel and test type out of each file name.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Default campaign name
pub const DEFAULT_GROUP: &str = "Lublin Diesel";

/// Fuel assumed when the file name names none
pub const DEFAULT_FUEL: &str = "diesel";

/// Known fuel short names, longest alternatives first
pub const KNOWN_FUELS: [&str; 15] = [
    "Efekta Agrotronika",
    "BIOW50",
    "HVO25",
    "Efecta",
    "Verwa",
    "Verva",
    "BIOW",
    "B20",
    "RME",
    "HVO",
    "AG2",
    "U75",
    "ONE",
    "HHO",
    "ON",
];

static DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}|\d{4}-\d{2}").expect("Invalid date regex")
});

static FUEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = KNOWN_FUELS.iter().map(|f| regex::escape(f)).collect();
    // Any non-alphanumeric character, `_` included, delimits a fuel name
    Regex::new(&format!(
        r"(?i)(?:^|[^\p{{L}}\d])({})(?:$|[^\p{{L}}\d])",
        alternatives.join("|")
    ))
    .expect("Invalid fuel regex")
});

static TEST_TYPE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        NRTC
        | NRTS
        | TRiL
        | TMiE
        | obc\ ?\d{3,4}
        | \d{4}\ RPM\ powtórka
        | \d{4}p?\ rpm
        | \d{4}p?",
    )
    .expect("Invalid test type regex")
});

static FILE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?)(_eco)?\.(csv|xlsx|xls|parquet)$").expect("Invalid file regex")
});

/// One bench session in the catalog
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    pub id: u32,
    pub main_file_name: String,
    pub eco_file_name: String,
    pub description: String,
    pub diesel_test_type: String,
    pub fuel: String,
    pub diesel_engine_name: String,
    pub test_date: String,
}

impl CatalogEntry {
    /// Path of the main bench file under `raw_dir`
    pub fn main_path(&self, raw_dir: &Path) -> Option<PathBuf> {
        (!self.main_file_name.is_empty()).then(|| raw_dir.join(&self.main_file_name))
    }
}

/// Catalog document
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    pub groups: BTreeMap<String, Vec<CatalogEntry>>,
}

impl Catalog {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let catalog = Self::from_json(&content)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))?;
        tracing::info!(
            "Loaded catalog {} with {} entries",
            path.display(),
            catalog.len()
        );
        Ok(catalog)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize catalog")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write catalog {}", path.display()))?;
        tracing::info!("Catalog written to {}", path.display());
        Ok(())
    }

    /// All entries across groups, ordered by id
    pub fn entries(&self) -> Vec<&CatalogEntry> {
        let mut entries: Vec<&CatalogEntry> = self.groups.values().flatten().collect();
        entries.sort_by_key(|e| e.id);
        entries
    }

    pub fn find(&self, id: u32) -> Option<&CatalogEntry> {
        self.groups.values().flatten().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(|g| g.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fields extracted from a bench file name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileNameInfo {
    pub test_date: String,
    pub fuel: String,
    pub test_type: String,
}

/// Read test date, fuel and test type from a file name (without extension).
///
/// The date is removed before looking for the test type so a year is not
/// mistaken for an engine speed.
pub fn parse_file_name(name: &str) -> FileNameInfo {
    let test_date = DATE_REGEX
        .find(name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let fuel = FUEL_REGEX
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| {
            KNOWN_FUELS
                .iter()
                .find(|f| f.eq_ignore_ascii_case(m.as_str()))
                .map(|f| f.to_string())
        })
        .unwrap_or_default();

    let without_date = DATE_REGEX.replace_all(name, " ");
    let test_type = TEST_TYPE_REGEX
        .find(&without_date)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    FileNameInfo {
        test_date,
        fuel,
        test_type,
    }
}

/// Builds a catalog from bench file names
#[derive(Clone, Debug)]
pub struct CatalogBuilder {
    pub group: String,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self {
            group: DEFAULT_GROUP.to_string(),
        }
    }
}

impl CatalogBuilder {
    /// Build from a list of file names. Files that are not bench exports are
    /// ignored; `<name>_eco.<ext>` is attached to `<name>.<ext>`. Ids start at
    /// 1 and follow sorted file-name order.
    pub fn build<S: AsRef<str>>(&self, file_names: &[S]) -> Catalog {
        let mut names: Vec<&str> = file_names.iter().map(|s| s.as_ref()).collect();
        names.sort_unstable();

        let mut order: Vec<String> = Vec::new();
        let mut entries: HashMap<String, CatalogEntry> = HashMap::new();

        for file_name in names {
            let Some(caps) = FILE_REGEX.captures(file_name) else {
                tracing::debug!("Skipping non-bench file {}", file_name);
                continue;
            };
            let base = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let is_eco = caps.get(2).is_some();
            let key = base.to_lowercase();

            let entry = entries.entry(key.clone()).or_insert_with(|| {
                let info = parse_file_name(base);
                order.push(key);
                CatalogEntry {
                    id: order.len() as u32,
                    fuel: if info.fuel.is_empty() {
                        DEFAULT_FUEL.to_string()
                    } else {
                        info.fuel
                    },
                    diesel_test_type: info.test_type,
                    test_date: info.test_date,
                    ..Default::default()
                }
            });

            if is_eco {
                entry.eco_file_name = file_name.to_string();
            } else {
                entry.main_file_name = file_name.to_string();
            }
        }

        let group: Vec<CatalogEntry> = order
            .iter()
            .filter_map(|key| entries.remove(key))
            .collect();

        tracing::info!("Built catalog with {} entries", group.len());

        let mut groups = BTreeMap::new();
        groups.insert(self.group.clone(), group);
        Catalog { groups }
    }

    /// Build from the files in `dir`
    pub fn scan(&self, dir: &Path) -> Result<Catalog> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        Ok(self.build(&names))
    }
}
