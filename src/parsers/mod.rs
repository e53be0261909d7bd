pub mod bench;
pub mod types;

pub use bench::BenchCsv;
pub use types::{ChannelPair, ParseError, Parseable, RawColumn, RawRun, RawTable};

use std::path::Path;
use strum::{AsRefStr, EnumString};

/// Supported input formats, keyed by file extension
#[derive(AsRefStr, Clone, Copy, Debug, EnumString, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum FileFormat {
    #[strum(serialize = "csv")]
    Csv,
    #[strum(serialize = "xlsx", serialize = "xls")]
    Excel,
    #[strum(serialize = "parquet")]
    Parquet,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

/// Decode raw bytes as UTF-8 (BOM stripped), falling back to Windows-1250,
/// the code page used by older bench software.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, had_errors) = encoding_rs::WINDOWS_1250.decode(bytes);
            if had_errors {
                tracing::warn!("Input is neither UTF-8 nor clean Windows-1250, some characters were replaced");
            }
            decoded.into_owned()
        }
    }
}

/// Load a bench export from disk
pub fn load_file(path: &Path, delimiter: u8) -> Result<RawTable, ParseError> {
    match FileFormat::from_path(path) {
        Some(FileFormat::Csv) => {
            let bytes = std::fs::read(path)?;
            let contents = decode_bytes(&bytes);
            let parser = BenchCsv::with_delimiter(delimiter);
            if !contents.is_empty() && !parser.detect(&contents) {
                return Err(ParseError::NotBenchExport(path.display().to_string()));
            }
            parser.parse(&contents)
        }
        Some(other) => Err(ParseError::UnsupportedFormat(other.as_ref().to_string())),
        None => Err(ParseError::UnsupportedFormat(
            path.extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_else(|| "<none>".to_string()),
        )),
    }
}
