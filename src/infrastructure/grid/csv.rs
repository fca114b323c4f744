// ============================================================
// CSV GRID READER
// ============================================================
// Decode uploaded CSV bytes into a raw cell grid, with encoding and
// delimiter detection. No header interpretation happens here.

use csv::{ReaderBuilder, Trim};

use crate::domain::error::{AppError, Result};
use crate::domain::grid::{CellGrid, CellValue};

pub struct CsvGridReader {
    delimiter: Option<u8>,
    trim: bool,
}

impl Default for CsvGridReader {
    fn default() -> Self {
        Self {
            delimiter: None,
            trim: true,
        }
    }
}

impl CsvGridReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a delimiter instead of auto-detecting one.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn read(&self, bytes: &[u8]) -> Result<CellGrid> {
        let content = decode_bytes(bytes);
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| Self::detect_delimiter(&content));

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;
            rows.push(record.iter().map(CellValue::from).collect());
        }

        Ok(CellGrid::new(rows))
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe) by
    /// scoring per-line consistency over a small sample.
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];
        let sample_lines: Vec<_> = content.lines().take(10).collect();

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        for &delimiter in &candidates {
            if sample_lines.is_empty() {
                continue;
            }

            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());
            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

/// UTF-8 first; Windows-1252 fallback for legacy supplier exports.
fn decode_bytes(bytes: &[u8]) -> String {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if !had_errors {
        return text.into_owned();
    }
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text.into_owned()
}
