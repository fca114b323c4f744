// ============================================================
// HEADER DETECTOR
// ============================================================
// Locate the header row within the first few rows of a cell grid.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::error::{AppError, Result};
use crate::domain::grid::{CellGrid, CellValue};
use crate::domain::mapping_config::MappingConfig;

/// Cells that are entirely digits plus grouping characters are data, not
/// labels.
static NUMERIC_CELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d[\d\s.,]*$").expect("numeric cell regex"));

/// Labels longer than this are narrative content, not column headers.
const MAX_LABEL_LEN: usize = 40;

/// Title-row guard: penalty applied when the candidate is immediately
/// followed by an all-label row of identical shape.
const REPEATED_TEXT_ROW_PENALTY: f64 = 0.25;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectedHeader {
    pub row_index: usize,
    /// Header cell texts, padded to the grid width so every valid column
    /// index resolves to a (possibly empty) header string.
    pub headers: Vec<String>,
    pub score: f64,
    /// True when the winning score is below the configured floor; the
    /// confirmation gate must then require operator review.
    pub low_confidence: bool,
}

pub struct HeaderDetector {
    config: MappingConfig,
}

impl HeaderDetector {
    pub fn new(config: MappingConfig) -> Self {
        Self { config }
    }

    /// Scan at most `header_scan_rows` rows and return the best header
    /// candidate. Ties go to the earliest row. Fails with `NoHeaderFound`
    /// when no row clears the non-empty threshold.
    pub fn detect(&self, grid: &CellGrid) -> Result<DetectedHeader> {
        let width = grid.width();
        if width == 0 || grid.row_count() == 0 {
            return Err(AppError::NoHeaderFound);
        }

        let scan = self.config.header_scan_rows.min(grid.row_count());
        let mut best: Option<(usize, f64)> = None;

        for index in 0..scan {
            let Some(score) = self.score_row(grid, index, width) else {
                continue;
            };
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((index, score)),
            }
        }

        let (row_index, score) = best.ok_or(AppError::NoHeaderFound)?;

        let row = grid.row(row_index).unwrap_or(&[]);
        let mut headers: Vec<String> = row.iter().map(|c| c.as_text()).collect();
        headers.resize(width, String::new());

        Ok(DetectedHeader {
            row_index,
            headers,
            score,
            low_confidence: score < self.config.header_confidence_floor,
        })
    }

    /// Score one candidate row, or None when it cannot be a header at all.
    fn score_row(&self, grid: &CellGrid, index: usize, width: usize) -> Option<f64> {
        let row = grid.row(index)?;
        let non_empty = row.iter().filter(|c| !c.is_empty()).count();
        if non_empty < 2 {
            return None;
        }

        let fill = non_empty as f64 / width as f64;
        if fill < self.config.min_header_fill {
            return None;
        }

        // A header row needs label text, not just filled cells.
        let labels = row.iter().filter(|c| is_label_cell(c)).count();
        if labels < 2 {
            return None;
        }
        let labelish = labels as f64 / non_empty as f64;

        let mut score = 0.45 * fill + 0.55 * labelish;

        if let Some(next) = grid.row(index + 1) {
            let next_non_empty = next.iter().filter(|c| !c.is_empty()).count();
            let next_all_labels =
                next_non_empty > 0 && next.iter().filter(|c| is_label_cell(c)).count() == next_non_empty;
            if next_non_empty == non_empty && next_all_labels && labelish >= 0.99 {
                score -= REPEATED_TEXT_ROW_PENALTY;
            }
        }

        Some(score.clamp(0.0, 1.0))
    }
}

fn is_label_cell(cell: &CellValue) -> bool {
    match cell {
        CellValue::Text(s) => {
            let s = s.trim();
            !s.is_empty() && s.chars().count() <= MAX_LABEL_LEN && !NUMERIC_CELL_RE.is_match(s)
        }
        _ => false,
    }
}
