use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Semantic slots the mapper tries to populate from spreadsheet columns.
///
/// `Description`, `Quantity` and `Unit` are required; a BOQ line without
/// them is not quotable. The rest are optional enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetField {
    ItemNumber,
    Description,
    MaterialType,
    Quantity,
    Unit,
    Specification,
    Notes,
}

impl TargetField {
    pub const ALL: [TargetField; 7] = [
        TargetField::ItemNumber,
        TargetField::Description,
        TargetField::MaterialType,
        TargetField::Quantity,
        TargetField::Unit,
        TargetField::Specification,
        TargetField::Notes,
    ];

    pub const REQUIRED: [TargetField; 3] = [
        TargetField::Description,
        TargetField::Quantity,
        TargetField::Unit,
    ];

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }

    /// Wire name, matching the camelCase keys of the upload/confirm API.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetField::ItemNumber => "itemNumber",
            TargetField::Description => "description",
            TargetField::MaterialType => "materialType",
            TargetField::Quantity => "quantity",
            TargetField::Unit => "unit",
            TargetField::Specification => "specification",
            TargetField::Notes => "notes",
        }
    }

    pub fn parse(name: &str) -> Option<TargetField> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }
}

impl std::fmt::Display for TargetField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attempted column assignment for a target field.
///
/// `column_index` is -1 and `detected_header` empty when the field could
/// not be mapped. Within one mapping set no two fields share a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub target_field: TargetField,
    pub detected_header: String,
    pub column_index: i32,
    pub confidence: f64,
    pub alternative_headers: Vec<String>,
}

impl ColumnMapping {
    pub fn unmapped(target_field: TargetField) -> Self {
        Self {
            target_field,
            detected_header: String::new(),
            column_index: -1,
            confidence: 0.0,
            alternative_headers: Vec::new(),
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.column_index >= 0
    }
}

/// One parsed data row. An errored row keeps whatever fields did parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedBoqItem {
    /// 1-based data-row number, stable between the tentative upload pass
    /// and the confirmed pass.
    pub row_number: u32,
    pub item_number: Option<String>,
    pub description: Option<String>,
    pub material_type: Option<String>,
    pub quantity: Option<BigDecimal>,
    pub unit: Option<String>,
    pub specification: Option<String>,
    pub notes: Option<String>,
    pub has_parsing_errors: bool,
    pub error_message: Option<String>,
}

impl ParsedBoqItem {
    pub fn empty(row_number: u32) -> Self {
        Self {
            row_number,
            item_number: None,
            description: None,
            material_type: None,
            quantity: None,
            unit: None,
            specification: None,
            notes: None,
            has_parsing_errors: false,
            error_message: None,
        }
    }
}

/// Aggregate returned to the caller for both Upload and Confirm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub boq_id: i64,
    pub filename: String,
    pub total_rows_parsed: usize,
    pub requires_confirmation: bool,
    pub overall_confidence: f64,
    pub column_mappings: Vec<ColumnMapping>,
    pub preview_items: Vec<ParsedBoqItem>,
    pub warnings: Vec<String>,
}

/// Lifecycle of a BOQ shell record: created Pending at upload, moved to
/// Confirmed exactly once. There is no further transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoqStatus {
    Pending,
    Confirmed,
}

/// Shell record persisted at upload time so a stable id exists before the
/// operator confirms the mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillOfQuantities {
    pub id: i64,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub status: BoqStatus,
}

/// Durable line item handed to the persistence collaborator on confirm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoqItem {
    pub id: i64,
    pub boq_id: i64,
    pub item_number: Option<String>,
    pub description: Option<String>,
    pub material_type: Option<String>,
    pub quantity: Option<BigDecimal>,
    pub unit: Option<String>,
    pub specification: Option<String>,
    pub notes: Option<String>,
    pub has_parsing_errors: bool,
}
