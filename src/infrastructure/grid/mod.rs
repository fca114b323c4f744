// ============================================================
// GRID READER
// ============================================================
// Turn uploaded file bytes into a CellGrid, dispatching on filename
// extension. This is the engine's only view of spreadsheet formats.

mod csv;
mod xlsx;

pub use self::csv::CsvGridReader;
pub use self::xlsx::read_workbook_grid;

use tracing::debug;

use crate::domain::error::{AppError, Result};
use crate::domain::grid::CellGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridFormat {
    Csv,
    Workbook,
}

pub struct GridReader {
    max_rows: usize,
}

impl GridReader {
    pub fn new(max_rows: usize) -> Self {
        Self { max_rows }
    }

    pub fn detect_format(filename: &str) -> Result<GridFormat> {
        let extension = filename
            .rsplit('.')
            .next()
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" | "txt" => Ok(GridFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(GridFormat::Workbook),
            other => Err(AppError::UnsupportedFormat(format!(
                "unrecognized extension '.{}'",
                other
            ))),
        }
    }

    /// Read the uploaded bytes into a grid, enforcing the row cap so
    /// oversized files fail fast instead of being processed unbounded.
    pub fn read(&self, filename: &str, bytes: &[u8]) -> Result<CellGrid> {
        let format = Self::detect_format(filename)?;
        let grid = match format {
            GridFormat::Csv => CsvGridReader::new().read(bytes)?,
            GridFormat::Workbook => read_workbook_grid(bytes)?,
        };

        if grid.row_count() > self.max_rows {
            return Err(AppError::SizeLimit(format!(
                "file has {} rows, cap is {}",
                grid.row_count(),
                self.max_rows
            )));
        }

        debug!(
            filename,
            rows = grid.row_count(),
            width = grid.width(),
            "read cell grid"
        );
        Ok(grid)
    }
}
