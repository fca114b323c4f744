// ============================================================
// ROW PARSER & VALIDATOR
// ============================================================
// Apply a finalized column mapping to every data row. Failures are
// recorded per row; one bad cell never aborts the batch.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::boq::{ColumnMapping, ParsedBoqItem, TargetField};
use crate::domain::grid::CellGrid;

/// "1,234,567" style: comma groups of three are thousands separators.
static COMMA_GROUPED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}(,\d{3})+$").expect("comma group regex"));

/// "1.234.567" style: only unambiguous with at least two dot groups,
/// since a single group ("1.234") reads as a decimal.
static DOT_GROUPED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}(\.\d{3}){2,}$").expect("dot group regex"));

#[derive(Debug, Clone, Default)]
pub struct RowParseOutcome {
    /// One item per non-empty data row, in source order.
    pub items: Vec<ParsedBoqItem>,
    pub empty_rows_skipped: usize,
    pub error_row_count: usize,
}

pub struct RowParser;

impl RowParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse every row after `header_row`. Fully empty rows are skipped
    /// and counted; everything else yields exactly one `ParsedBoqItem`.
    /// `row_number` is the 1-based offset from the header row, so it
    /// matches the source grid and is stable across passes.
    pub fn parse(
        &self,
        grid: &CellGrid,
        header_row: usize,
        mappings: &[ColumnMapping],
    ) -> RowParseOutcome {
        let unmapped_required: Vec<TargetField> = TargetField::REQUIRED
            .iter()
            .copied()
            .filter(|f| {
                !mappings
                    .iter()
                    .any(|m| m.target_field == *f && m.is_mapped())
            })
            .collect();

        let mut outcome = RowParseOutcome::default();

        for index in (header_row + 1)..grid.row_count() {
            if grid.is_row_empty(index) {
                outcome.empty_rows_skipped += 1;
                continue;
            }

            let row_number = (index - header_row) as u32;
            let mut item = ParsedBoqItem::empty(row_number);
            let mut errors: Vec<String> = unmapped_required
                .iter()
                .map(|f| format!("No column mapped for required field '{}'", f))
                .collect();

            for mapping in mappings.iter().filter(|m| m.is_mapped()) {
                let text = grid
                    .cell(index, mapping.column_index as usize)
                    .map(|c| c.as_text())
                    .unwrap_or_default();

                if mapping.target_field == TargetField::Quantity {
                    match parse_quantity(&text) {
                        Ok(quantity) => item.quantity = Some(quantity),
                        Err(reason) => errors.push(format!(
                            "Invalid quantity '{}' in column '{}': {}",
                            text, mapping.detected_header, reason
                        )),
                    }
                } else {
                    let value = (!text.is_empty()).then_some(text);
                    match mapping.target_field {
                        TargetField::ItemNumber => item.item_number = value,
                        TargetField::Description => item.description = value,
                        TargetField::MaterialType => item.material_type = value,
                        TargetField::Unit => item.unit = value,
                        TargetField::Specification => item.specification = value,
                        TargetField::Notes => item.notes = value,
                        TargetField::Quantity => {}
                    }
                }
            }

            if !errors.is_empty() {
                item.has_parsing_errors = true;
                item.error_message = Some(errors.join("; "));
                outcome.error_row_count += 1;
            }

            outcome.items.push(item);
        }

        outcome
    }
}

impl Default for RowParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Exact-decimal coercion accepting the separator conventions seen in
/// supplier sheets: "1,234.56", "1.234,56", "1 234,56", "1'234.5".
pub fn parse_quantity(raw: &str) -> Result<BigDecimal, String> {
    let mut s: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '\u{2019}')
        .collect();

    if s.is_empty() {
        return Err("cell is empty".to_string());
    }

    let negative = s.starts_with('-');
    if negative || s.starts_with('+') {
        s.remove(0);
    }

    let has_comma = s.contains(',');
    let has_dot = s.contains('.');

    let normalized = if has_comma && has_dot {
        // The rightmost separator is the decimal point.
        let decimal_sep = if s.rfind(',') > s.rfind('.') { ',' } else { '.' };
        let grouping = if decimal_sep == ',' { '.' } else { ',' };
        s.chars()
            .filter(|c| *c != grouping)
            .map(|c| if c == decimal_sep { '.' } else { c })
            .collect()
    } else if has_comma {
        if COMMA_GROUPED_RE.is_match(&s) {
            s.replace(',', "")
        } else {
            s.replace(',', ".")
        }
    } else if has_dot && DOT_GROUPED_RE.is_match(&s) {
        s.replace('.', "")
    } else {
        s
    };

    let value = BigDecimal::from_str(&normalized)
        .map_err(|_| "not a decimal number".to_string())?;

    Ok(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::CellValue;

    fn decimal(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn grid(rows: Vec<Vec<&str>>) -> CellGrid {
        CellGrid::new(
            rows.into_iter()
                .map(|r| r.into_iter().map(CellValue::from).collect())
                .collect(),
        )
    }

    fn mapped(field: TargetField, header: &str, col: i32) -> ColumnMapping {
        ColumnMapping {
            target_field: field,
            detected_header: header.to_string(),
            column_index: col,
            confidence: 1.0,
            alternative_headers: Vec::new(),
        }
    }

    fn standard_mappings() -> Vec<ColumnMapping> {
        vec![
            mapped(TargetField::ItemNumber, "Pos", 0),
            mapped(TargetField::Description, "Description", 1),
            mapped(TargetField::Quantity, "Qty", 2),
            mapped(TargetField::Unit, "Unit", 3),
        ]
    }

    #[test]
    fn test_quantity_separator_variants() {
        assert_eq!(parse_quantity("1,234.56").unwrap(), decimal("1234.56"));
        assert_eq!(parse_quantity("1.234,56").unwrap(), decimal("1234.56"));
        assert_eq!(parse_quantity("1 234,56").unwrap(), decimal("1234.56"));
        assert_eq!(parse_quantity("1'234.5").unwrap(), decimal("1234.5"));
        assert_eq!(parse_quantity("12,5").unwrap(), decimal("12.5"));
        assert_eq!(parse_quantity("1,234").unwrap(), decimal("1234"));
        assert_eq!(parse_quantity("1.234").unwrap(), decimal("1.234"));
        assert_eq!(parse_quantity("1.234.500").unwrap(), decimal("1234500"));
        assert_eq!(parse_quantity("-7.5").unwrap(), decimal("-7.5"));
        assert_eq!(parse_quantity("\u{a0}42").unwrap(), decimal("42"));
    }

    #[test]
    fn test_quantity_rejects_garbage() {
        assert!(parse_quantity("abc").is_err());
        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("12m3").is_err());
        assert!(parse_quantity("1,2,3").is_err());
    }

    #[test]
    fn test_bad_quantity_keeps_rest_of_row() {
        let g = grid(vec![
            vec!["Pos", "Description", "Qty", "Unit"],
            vec!["1", "Steel beam", "abc", "kg"],
            vec!["2", "Concrete C30", "12.5", "m3"],
        ]);
        let outcome = RowParser::new().parse(&g, 0, &standard_mappings());

        assert_eq!(outcome.items.len(), 2);
        assert_eq!(outcome.error_row_count, 1);

        let bad = &outcome.items[0];
        assert_eq!(bad.row_number, 1);
        assert!(bad.has_parsing_errors);
        assert!(bad.error_message.as_deref().unwrap().contains("abc"));
        assert_eq!(bad.description.as_deref(), Some("Steel beam"));
        assert_eq!(bad.unit.as_deref(), Some("kg"));
        assert!(bad.quantity.is_none());

        let good = &outcome.items[1];
        assert_eq!(good.row_number, 2);
        assert!(!good.has_parsing_errors);
        assert_eq!(good.quantity, Some(decimal("12.5")));
    }

    #[test]
    fn test_empty_rows_skipped_and_counted() {
        let g = grid(vec![
            vec!["Pos", "Description", "Qty", "Unit"],
            vec!["1", "Concrete", "5", "m3"],
            vec!["", "", "", ""],
            vec!["2", "Rebar", "100", "kg"],
        ]);
        let outcome = RowParser::new().parse(&g, 0, &standard_mappings());

        assert_eq!(outcome.items.len(), 2);
        assert_eq!(outcome.empty_rows_skipped, 1);
        // Row numbers match the source grid, so the gap survives.
        assert_eq!(outcome.items[0].row_number, 1);
        assert_eq!(outcome.items[1].row_number, 3);
    }

    #[test]
    fn test_unmapped_optional_left_empty() {
        let g = grid(vec![
            vec!["Description", "Qty", "Unit"],
            vec!["Concrete", "5", "m3"],
        ]);
        let mappings = vec![
            mapped(TargetField::Description, "Description", 0),
            mapped(TargetField::Quantity, "Qty", 1),
            mapped(TargetField::Unit, "Unit", 2),
            ColumnMapping::unmapped(TargetField::Notes),
        ];
        let outcome = RowParser::new().parse(&g, 0, &mappings);
        let item = &outcome.items[0];
        assert!(!item.has_parsing_errors);
        assert!(item.notes.is_none());
        assert!(item.item_number.is_none());
    }

    #[test]
    fn test_unmapped_required_marks_rows_errored() {
        let g = grid(vec![
            vec!["Description", "Qty"],
            vec!["Concrete", "5"],
        ]);
        let mappings = vec![
            mapped(TargetField::Description, "Description", 0),
            mapped(TargetField::Quantity, "Qty", 1),
            ColumnMapping::unmapped(TargetField::Unit),
        ];
        let outcome = RowParser::new().parse(&g, 0, &mappings);
        let item = &outcome.items[0];
        assert!(item.has_parsing_errors);
        assert!(item
            .error_message
            .as_deref()
            .unwrap()
            .contains("required field 'unit'"));
        // The mapped fields still parse.
        assert_eq!(item.description.as_deref(), Some("Concrete"));
        assert_eq!(item.quantity, Some(decimal("5")));
    }

    #[test]
    fn test_missing_quantity_cell_is_an_error() {
        let g = grid(vec![
            vec!["Description", "Qty", "Unit"],
            vec!["Section heading", "", "m"],
        ]);
        let mappings = vec![
            mapped(TargetField::Description, "Description", 0),
            mapped(TargetField::Quantity, "Qty", 1),
            mapped(TargetField::Unit, "Unit", 2),
        ];
        let outcome = RowParser::new().parse(&g, 0, &mappings);
        let item = &outcome.items[0];
        assert!(item.has_parsing_errors);
        assert_eq!(item.description.as_deref(), Some("Section heading"));
    }
}
