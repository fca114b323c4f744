// ============================================================
// MAPPING CONFIGURATION
// ============================================================
// Synonym tables and confidence thresholds for column mapping.
// Kept as data so they can be tuned and tested independently of
// the matching algorithm.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::boq::TargetField;

/// Configuration for header detection, column mapping and row parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Known header synonyms per target field, matched after
    /// normalization (case/diacritic folding, separator collapsing).
    pub synonyms: HashMap<TargetField, Vec<String>>,

    /// Overall confidence below this forces operator confirmation
    /// (default: 0.75).
    pub acceptance_threshold: f64,

    /// Columns scoring below this floor are never auto-assigned
    /// (default: 0.55).
    pub min_column_confidence: f64,

    /// Runner-up headers reported per field (default: 3).
    pub max_alternatives: usize,

    /// How many leading rows are scanned for the header row (default: 8).
    pub header_scan_rows: usize,

    /// Minimum fraction of non-empty cells (relative to the widest row)
    /// for a header-row candidate (default: 0.5).
    pub min_header_fill: f64,

    /// Header-row scores below this mark the detection as low-confidence,
    /// which forces operator confirmation (default: 0.6).
    pub header_confidence_floor: f64,

    /// Hard cap on grid rows; larger uploads fail fast (default: 50_000).
    pub max_rows: usize,

    /// Upper bound on `preview_items` returned to the caller (default: 50).
    pub preview_limit: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            synonyms: default_synonyms(),
            acceptance_threshold: 0.75,
            min_column_confidence: 0.55,
            max_alternatives: 3,
            header_scan_rows: 8,
            min_header_fill: 0.5,
            header_confidence_floor: 0.6,
            max_rows: 50_000,
            preview_limit: 50,
        }
    }
}

impl MappingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn synonyms_for(&self, field: TargetField) -> &[String] {
        self.synonyms
            .get(&field)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.acceptance_threshold) {
            return Err("acceptance_threshold must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_column_confidence) {
            return Err("min_column_confidence must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_header_fill) {
            return Err("min_header_fill must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.header_confidence_floor) {
            return Err("header_confidence_floor must be between 0.0 and 1.0".to_string());
        }
        if self.header_scan_rows == 0 {
            return Err("header_scan_rows must be > 0".to_string());
        }
        if self.max_rows == 0 {
            return Err("max_rows must be > 0".to_string());
        }
        for field in TargetField::REQUIRED {
            if self.synonyms_for(field).is_empty() {
                return Err(format!("synonyms for required field '{}' are empty", field));
            }
        }
        Ok(())
    }
}

// Built-in synonym table. Tokens are language-agnostic on purpose: the
// supplier sheets this engine sees mix English, Estonian and German
// headers in the same file.
fn default_synonyms() -> HashMap<TargetField, Vec<String>> {
    let mut table = HashMap::new();

    let entries: [(TargetField, &[&str]); 7] = [
        (
            TargetField::ItemNumber,
            &[
                "item no", "item number", "item nr", "no", "nr", "pos", "position", "code",
                "jrk", "jrk nr",
            ],
        ),
        (
            TargetField::Description,
            &[
                "description", "item description", "work description", "desc", "name",
                "nimetus", "kirjeldus", "beschreibung", "töö nimetus",
            ],
        ),
        (
            TargetField::MaterialType,
            &["material", "material type", "materjal", "category", "werkstoff"],
        ),
        (
            TargetField::Quantity,
            &["qty", "quantity", "amount", "kogus", "maht", "menge"],
        ),
        (
            TargetField::Unit,
            &[
                "unit", "units", "uom", "unit of measure", "measure", "ühik", "yhik",
                "einheit",
            ],
        ),
        (
            TargetField::Specification,
            &["specification", "spec", "standard", "grade", "spetsifikatsioon"],
        ),
        (
            TargetField::Notes,
            &["notes", "note", "comments", "comment", "remarks", "märkused", "markused"],
        ),
    ];

    for (field, synonyms) in entries {
        table.insert(field, synonyms.iter().map(|s| s.to_string()).collect());
    }

    table
}
