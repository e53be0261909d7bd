//! CSV export of processed runs.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::frame::{ms_to_datetime, Frame, TIME_COLUMN};
use crate::metadata::temp_path;
use crate::normalize::english_rename;
use crate::settings::OutputConfig;

/// Timestamp format of the `Time` column
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Output file name for a processed bench file: `<stem>_stable.csv`
pub fn output_file_name(source: &str) -> String {
    let stem = Path::new(source)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| source.to_string());
    format!("{}_stable.csv", stem)
}

/// Format one cell; nulls are empty fields
fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write `frame` as CSV. The `Time` column comes first as an absolute
/// timestamp. Data goes to a temp file that is renamed into place once
/// complete.
pub fn write_csv(frame: &Frame, path: &Path, config: &OutputConfig) -> Result<PathBuf> {
    let mut frame = frame.clone();
    if config.english_headers {
        frame.rename_columns(english_rename);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let tmp = temp_path(path);
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(config.delimiter_byte())
            .from_path(&tmp)
            .with_context(|| format!("Failed to create {}", tmp.display()))?;

        let mut header = vec![TIME_COLUMN.to_string()];
        header.extend(frame.column_names().into_iter().map(String::from));
        writer.write_record(&header)?;

        for (row, &ms) in frame.times.iter().enumerate() {
            let time = ms_to_datetime(ms)
                .map(|t| t.format(TIME_FORMAT).to_string())
                .unwrap_or_default();
            let mut record = Vec::with_capacity(frame.columns.len() + 1);
            record.push(time);
            record.extend(
                frame
                    .columns
                    .iter()
                    .map(|c| format_value(c.values.get(row).copied().flatten())),
            );
            writer.write_record(&record)?;
        }
        writer.flush()?;
    }

    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move {} into place", path.display()))?;

    tracing::info!("Wrote {} rows to {}", frame.len(), path.display());
    Ok(path.to_path_buf())
}
