// ============================================================
// EXCEL GRID READER
// ============================================================
// Decode uploaded workbook bytes (xlsx/xls/xlsb/ods) into a raw cell
// grid via calamine. Only the first worksheet is read; supplier BOQs
// put the bill on the first sheet.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::domain::error::{AppError, Result};
use crate::domain::grid::{CellGrid, CellValue};

pub fn read_workbook_grid(bytes: &[u8]) -> Result<CellGrid> {
    let cursor = Cursor::new(bytes);
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| AppError::UnsupportedFormat(format!("cannot open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::UnsupportedFormat("workbook has no worksheets".to_string()))?
        .map_err(|e| AppError::ParseError(format!("failed to read worksheet: {}", e)))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    Ok(CellGrid::new(rows))
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        // Dates, durations and cell errors surface as their display text;
        // the row parser decides whether that text is usable.
        other => CellValue::from(other.to_string().as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_are_unsupported() {
        let result = read_workbook_grid(b"definitely not a workbook");
        assert!(matches!(result, Err(AppError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_cell_conversion() {
        assert_eq!(convert_cell(&Data::Empty), CellValue::Empty);
        assert_eq!(
            convert_cell(&Data::String("kg".into())),
            CellValue::Text("kg".into())
        );
        assert_eq!(convert_cell(&Data::Float(2.5)), CellValue::Number(2.5));
        assert_eq!(convert_cell(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(convert_cell(&Data::Bool(true)), CellValue::Bool(true));
    }
}
