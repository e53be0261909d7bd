use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while reading a bench export
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("Not a bench export: {0}")]
    NotBenchExport(String),
    #[error("File contains no data rows")]
    Empty,
    #[error("File has no header line")]
    MissingHeader,
}

/// One column of a raw bench export. Missing or unparsable cells are `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RawColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl RawColumn {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Number of non-null cells
    pub fn non_null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// Wide table as exported by the bench: every physical channel is a
/// time column followed by its value column.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RawTable {
    pub columns: Vec<RawColumn>,
}

impl RawTable {
    pub fn new(columns: Vec<RawColumn>) -> Self {
        Self { columns }
    }

    /// Number of rows (length of the longest column)
    pub fn row_count(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.values.len())
            .max()
            .unwrap_or(0)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Find column index by exact name
    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.find_column_index(name).is_some()
    }

    /// Resolve `(time, value)` pairs for the requested value columns.
    ///
    /// The bench writes each channel as `Czas [ms]` followed by the value
    /// column, so the time column is the one immediately before the value.
    /// Value columns that are absent, or that sit in the first position, are
    /// left out of the result.
    pub fn pair_channels(&self, value_columns: &[String]) -> Vec<ChannelPair> {
        value_columns
            .iter()
            .filter_map(|value| {
                let idx = self.find_column_index(value)?;
                if idx == 0 {
                    tracing::warn!("Value column '{}' has no preceding time column", value);
                    return None;
                }
                Some(ChannelPair::new(&self.columns[idx - 1].name, value))
            })
            .collect()
    }
}

/// A value column together with the time column it was sampled on
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
pub struct ChannelPair {
    pub time_column: String,
    pub value_column: String,
}

impl ChannelPair {
    pub fn new(time_column: impl Into<String>, value_column: impl Into<String>) -> Self {
        Self {
            time_column: time_column.into(),
            value_column: value_column.into(),
        }
    }
}

/// One test-bench session ready for processing
#[derive(Clone, Debug, Default, Serialize)]
pub struct RawRun {
    /// Catalog id, 0 when the run was loaded ad hoc
    pub id: u32,
    /// Source file name
    pub source: String,
    /// Fuel short name used to look up fuel properties
    pub fuel: String,
    /// Test type identifier (e.g. "NRTC", "obc 1500")
    pub test_type: String,
    pub table: RawTable,
    pub pairs: Vec<ChannelPair>,
}

impl RawRun {
    /// Key used for logging and the metadata store
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.id, self.source, self.fuel)
    }
}

/// Rename duplicate header names the way pandas does: the first occurrence
/// keeps its name, later ones get `.1`, `.2`, ...
pub fn deduplicate_headers<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut result = Vec::with_capacity(headers.len());

    for header in headers {
        let mut name = header.as_ref().to_string();
        let mut seen = counts.get(&name).copied().unwrap_or(0);
        while seen > 0 {
            counts.insert(name.clone(), seen + 1);
            name = format!("{}.{}", name, seen);
            seen = counts.get(&name).copied().unwrap_or(0);
        }
        counts.insert(name.clone(), seen + 1);
        result.push(name);
    }

    result
}

/// Trait for bench export parsers
pub trait Parseable {
    fn parse(&self, data: &str) -> Result<RawTable, ParseError>;
}
