//! Test-bench CSV export parser
//!
//! The bench control software writes one wide table per session. Every
//! physical channel occupies two columns: a `Czas [ms]` time column and the
//! value column (Polish header with the unit in brackets). Channels come from
//! different acquisition sub-systems, so the time columns are not aligned and
//! the shorter channels are padded with empty cells at the bottom.
//!
//! Format:
//! - Delimiter `;` (configurable)
//! - First line is the header; duplicated `Czas [ms]` names are renamed
//!   `Czas [ms].1`, `Czas [ms].2`, ...
//! - Decimal separator is `.` or `,`

use super::types::{deduplicate_headers, ParseError, Parseable, RawColumn, RawTable};

/// Bench CSV parser
#[derive(Clone, Debug)]
pub struct BenchCsv {
    pub delimiter: u8,
}

impl Default for BenchCsv {
    fn default() -> Self {
        Self { delimiter: b';' }
    }
}

impl BenchCsv {
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Detect if content looks like a bench export (a delimited header with
    /// at least one `Czas` time column)
    pub fn detect(&self, contents: &str) -> bool {
        contents
            .lines()
            .next()
            .map(|header| header.contains(self.delimiter as char) && header.contains("Czas"))
            .unwrap_or(false)
    }

    /// Parse one cell. Accepts both `.` and `,` as decimal separator.
    pub fn parse_cell(cell: &str) -> Option<f64> {
        let cell = cell.trim();
        if cell.is_empty() {
            return None;
        }
        let parsed = if cell.contains(',') {
            cell.replace(',', ".").parse::<f64>().ok()
        } else {
            cell.parse::<f64>().ok()
        };
        parsed.filter(|v| v.is_finite())
    }
}

impl Parseable for BenchCsv {
    fn parse(&self, file_contents: &str) -> Result<RawTable, ParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .has_headers(true)
            .from_reader(file_contents.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ParseError::MissingHeader);
        }

        let names = deduplicate_headers(&headers);
        let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); names.len()];
        let mut skipped = 0usize;

        for result in reader.records() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    skipped += 1;
                    tracing::warn!("Skipping malformed bench row: {}", e);
                    continue;
                }
            };

            // Rows shorter than the header are padded with nulls
            for (i, column) in columns.iter_mut().enumerate() {
                column.push(record.get(i).and_then(Self::parse_cell));
            }
        }

        let row_count = columns.first().map(|c| c.len()).unwrap_or(0);
        if row_count == 0 {
            return Err(ParseError::Empty);
        }

        tracing::info!(
            "Parsed bench export: {} columns, {} rows ({} skipped)",
            names.len(),
            row_count,
            skipped
        );

        Ok(RawTable::new(
            names
                .into_iter()
                .zip(columns)
                .map(|(name, values)| RawColumn::new(name, values))
                .collect(),
        ))
    }
}
