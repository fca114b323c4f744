// ============================================================
// UPLOAD / CONFIRM ORCHESTRATOR
// ============================================================
// Two entry points over one pipeline: a tentative upload with
// auto-detected mapping, and an authoritative confirm with an
// operator-edited mapping. The calls are correlated by boq_id; the
// grid is not retained between them, the caller resubmits the bytes.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::application::use_cases::column_mapper::ColumnMapper;
use crate::application::use_cases::confirmation::{ConfirmationGate, GateDecision};
use crate::application::use_cases::header_detector::HeaderDetector;
use crate::application::use_cases::row_parser::{RowParseOutcome, RowParser};
use crate::domain::boq::{ColumnMapping, TargetField, UploadResult};
use crate::domain::error::{AppError, Result};
use crate::domain::mapping_config::MappingConfig;
use crate::infrastructure::grid::GridReader;
use crate::infrastructure::persistence::BoqRepository;

/// Operator-confirmed mapping for a previously uploaded BOQ. Keys are
/// the camelCase target field names from the upload response.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmMappingRequest {
    #[validate(range(min = 1, message = "BOQ ID is required"))]
    pub boq_id: i64,

    #[validate(length(min = 1, message = "Column mappings are required"))]
    pub column_mappings: HashMap<String, i32>,
}

pub struct BoqUploadUseCase {
    config: MappingConfig,
    reader: GridReader,
    header_detector: HeaderDetector,
    column_mapper: ColumnMapper,
    gate: ConfirmationGate,
    row_parser: RowParser,
    repository: Arc<dyn BoqRepository>,
}

impl BoqUploadUseCase {
    pub fn new(config: MappingConfig, repository: Arc<dyn BoqRepository>) -> Result<Self> {
        config.validate().map_err(AppError::ValidationError)?;
        Ok(Self {
            reader: GridReader::new(config.max_rows),
            header_detector: HeaderDetector::new(config.clone()),
            column_mapper: ColumnMapper::new(config.clone()),
            gate: ConfirmationGate::new(config.clone()),
            row_parser: RowParser::new(),
            repository,
            config,
        })
    }

    /// Tentative pass: detect the mapping, parse a preview, persist only
    /// the BOQ shell. Items are not persisted here even when the mapping
    /// clears the gate; committing a preview is the caller's policy.
    pub async fn upload(&self, filename: &str, bytes: &[u8]) -> Result<UploadResult> {
        let grid = self.reader.read(filename, bytes)?;
        let detected = self.header_detector.detect(&grid)?;
        let mappings = self.column_mapper.map_columns(&detected.headers);
        let decision = self.gate.evaluate(&mappings, detected.low_confidence);
        let outcome = self.row_parser.parse(&grid, detected.row_index, &mappings);

        let boq = self.repository.create_boq(filename).await?;

        if decision.requires_confirmation {
            warn!(
                boq_id = boq.id,
                overall_confidence = decision.overall_confidence,
                "mapping requires operator confirmation"
            );
        }
        info!(
            boq_id = boq.id,
            filename,
            header_row = detected.row_index,
            rows = outcome.items.len(),
            error_rows = outcome.error_row_count,
            "BOQ upload parsed"
        );

        Ok(self.build_result(boq.id, filename, mappings, decision, outcome))
    }

    /// Authoritative pass: apply the operator-edited mapping, persist the
    /// resulting items and move the shell to Confirmed. Terminal state.
    pub async fn confirm(&self, request: &ConfirmMappingRequest, bytes: &[u8]) -> Result<UploadResult> {
        request
            .validate()
            .map_err(|e| AppError::BadMapping(e.to_string()))?;

        let boq = self.repository.get_boq(request.boq_id).await?;
        let grid = self.reader.read(&boq.filename, bytes)?;
        // Deterministic, so this lands on the same row the upload saw.
        let detected = self.header_detector.detect(&grid)?;

        let mappings = build_confirmed_mappings(&request.column_mappings, &detected.headers)?;
        let outcome = self.row_parser.parse(&grid, detected.row_index, &mappings);

        self.repository
            .replace_items(boq.id, &outcome.items)
            .await?;
        self.repository.mark_confirmed(boq.id).await?;

        info!(
            boq_id = boq.id,
            items = outcome.items.len(),
            error_rows = outcome.error_row_count,
            "BOQ mapping confirmed, items persisted"
        );

        // A human chose this mapping; nothing left to confirm.
        let decision = GateDecision {
            overall_confidence: 1.0,
            requires_confirmation: false,
            warnings: Vec::new(),
        };
        Ok(self.build_result(boq.id, &boq.filename, mappings, decision, outcome))
    }

    fn build_result(
        &self,
        boq_id: i64,
        filename: &str,
        column_mappings: Vec<ColumnMapping>,
        decision: GateDecision,
        outcome: RowParseOutcome,
    ) -> UploadResult {
        let GateDecision {
            overall_confidence,
            requires_confirmation,
            mut warnings,
        } = decision;
        let total = outcome.items.len();

        if outcome.error_row_count > 0 {
            warnings.push(format!(
                "{} rows had parsing errors and need review",
                outcome.error_row_count
            ));
        }
        if outcome.empty_rows_skipped > 0 {
            warnings.push(format!(
                "{} empty rows were skipped",
                outcome.empty_rows_skipped
            ));
        }
        if total == 0 {
            warnings.push("No data rows found after the header row".to_string());
        }

        let mut preview_items = outcome.items;
        if preview_items.len() > self.config.preview_limit {
            warnings.push(format!(
                "Preview limited to the first {} of {} rows",
                self.config.preview_limit, total
            ));
            preview_items.truncate(self.config.preview_limit);
        }

        UploadResult {
            boq_id,
            filename: filename.to_string(),
            total_rows_parsed: total,
            requires_confirmation,
            overall_confidence,
            column_mappings,
            preview_items,
            warnings,
        }
    }
}

/// Turn the operator's field -> column map into a full mapping set.
/// Confidence is fixed at 1.0; a human chose these columns.
fn build_confirmed_mappings(
    requested: &HashMap<String, i32>,
    headers: &[String],
) -> Result<Vec<ColumnMapping>> {
    let mut by_field: HashMap<TargetField, i32> = HashMap::new();
    for (name, &index) in requested {
        let field = TargetField::parse(name)
            .ok_or_else(|| AppError::BadMapping(format!("unknown target field '{}'", name)))?;
        if index < 0 || index as usize >= headers.len() {
            return Err(AppError::BadMapping(format!(
                "column index {} for '{}' is out of range (0..{})",
                index,
                field,
                headers.len()
            )));
        }
        by_field.insert(field, index);
    }

    let mut seen: HashMap<i32, TargetField> = HashMap::new();
    for field in TargetField::ALL {
        if let Some(&index) = by_field.get(&field) {
            if let Some(previous) = seen.insert(index, field) {
                return Err(AppError::BadMapping(format!(
                    "column {} is mapped to both '{}' and '{}'",
                    index, previous, field
                )));
            }
        }
    }

    for field in TargetField::REQUIRED {
        if !by_field.contains_key(&field) {
            return Err(AppError::BadMapping(format!(
                "required field '{}' is missing from the mapping",
                field
            )));
        }
    }

    Ok(TargetField::ALL
        .iter()
        .map(|&field| match by_field.get(&field) {
            Some(&index) => ColumnMapping {
                target_field: field,
                detected_header: headers[index as usize].clone(),
                column_index: index,
                confidence: 1.0,
                alternative_headers: Vec::new(),
            },
            None => ColumnMapping::unmapped(field),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::boq::BoqStatus;
    use crate::infrastructure::persistence::InMemoryBoqRepository;

    const CLEAN_CSV: &[u8] =
        b"Pos,Description,Qty,Unit\n1,Steel beam,10,kg\n2,Concrete C30,12.5,m3\n";

    fn use_case() -> (BoqUploadUseCase, Arc<InMemoryBoqRepository>) {
        let repo = Arc::new(InMemoryBoqRepository::new());
        let use_case =
            BoqUploadUseCase::new(MappingConfig::default(), repo.clone()).unwrap();
        (use_case, repo)
    }

    fn auto_detected_request(result: &UploadResult) -> ConfirmMappingRequest {
        let column_mappings = result
            .column_mappings
            .iter()
            .filter(|m| m.is_mapped())
            .map(|m| (m.target_field.as_str().to_string(), m.column_index))
            .collect();
        ConfirmMappingRequest {
            boq_id: result.boq_id,
            column_mappings,
        }
    }

    #[tokio::test]
    async fn test_upload_clean_file_clears_gate() {
        let (use_case, repo) = use_case();
        let result = use_case.upload("offer.csv", CLEAN_CSV).await.unwrap();

        assert!(!result.requires_confirmation);
        assert_eq!(result.overall_confidence, 1.0);
        assert_eq!(result.total_rows_parsed, 2);
        assert_eq!(result.preview_items.len(), 2);
        assert_eq!(result.preview_items[0].description.as_deref(), Some("Steel beam"));

        // Shell persisted, items not yet.
        let boq = repo.get_boq(result.boq_id).await.unwrap();
        assert_eq!(boq.status, BoqStatus::Pending);
        assert!(repo.list_items(result.boq_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_vague_headers_requires_confirmation() {
        let (use_case, _) = use_case();
        let csv = b"Misc,Qty,Unit\nSteel,5,kg\n";
        let result = use_case.upload("vague.csv", csv).await.unwrap();
        assert!(result.requires_confirmation);
        let config = MappingConfig::default();
        assert!(result.overall_confidence < config.acceptance_threshold);
    }

    #[tokio::test]
    async fn test_upload_is_idempotent_except_boq_id() {
        let (use_case, _) = use_case();
        let first = use_case.upload("offer.csv", CLEAN_CSV).await.unwrap();
        let second = use_case.upload("offer.csv", CLEAN_CSV).await.unwrap();

        assert_ne!(first.boq_id, second.boq_id);
        assert_eq!(first.column_mappings, second.column_mappings);
        assert_eq!(first.preview_items, second.preview_items);
        assert_eq!(first.overall_confidence, second.overall_confidence);
        assert_eq!(first.warnings, second.warnings);
    }

    #[tokio::test]
    async fn test_confirm_round_trips_upload_preview() {
        let (use_case, repo) = use_case();
        let uploaded = use_case.upload("offer.csv", CLEAN_CSV).await.unwrap();

        let request = auto_detected_request(&uploaded);
        let confirmed = use_case.confirm(&request, CLEAN_CSV).await.unwrap();

        assert_eq!(confirmed.boq_id, uploaded.boq_id);
        assert!(!confirmed.requires_confirmation);
        assert_eq!(confirmed.overall_confidence, 1.0);
        assert_eq!(confirmed.preview_items, uploaded.preview_items);

        let boq = repo.get_boq(uploaded.boq_id).await.unwrap();
        assert_eq!(boq.status, BoqStatus::Confirmed);
        let items = repo.list_items(uploaded.boq_id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].description.as_deref(), Some("Steel beam"));
    }

    #[tokio::test]
    async fn test_confirm_rejects_duplicate_columns() {
        let (use_case, _) = use_case();
        let uploaded = use_case.upload("offer.csv", CLEAN_CSV).await.unwrap();

        let mut request = auto_detected_request(&uploaded);
        request
            .column_mappings
            .insert("description".to_string(), 2);
        request.column_mappings.insert("quantity".to_string(), 2);

        let result = use_case.confirm(&request, CLEAN_CSV).await;
        assert!(matches!(result, Err(AppError::BadMapping(_))));
    }

    #[tokio::test]
    async fn test_confirm_rejects_out_of_range_index() {
        let (use_case, _) = use_case();
        let uploaded = use_case.upload("offer.csv", CLEAN_CSV).await.unwrap();

        let mut request = auto_detected_request(&uploaded);
        request.column_mappings.insert("notes".to_string(), 99);

        let result = use_case.confirm(&request, CLEAN_CSV).await;
        assert!(matches!(result, Err(AppError::BadMapping(_))));
    }

    #[tokio::test]
    async fn test_confirm_rejects_unknown_field_and_missing_required() {
        let (use_case, _) = use_case();
        let uploaded = use_case.upload("offer.csv", CLEAN_CSV).await.unwrap();

        let mut request = auto_detected_request(&uploaded);
        request.column_mappings.insert("price".to_string(), 3);
        assert!(matches!(
            use_case.confirm(&request, CLEAN_CSV).await,
            Err(AppError::BadMapping(_))
        ));

        let mut request = auto_detected_request(&uploaded);
        request.column_mappings.remove("unit");
        assert!(matches!(
            use_case.confirm(&request, CLEAN_CSV).await,
            Err(AppError::BadMapping(_))
        ));
    }

    #[tokio::test]
    async fn test_confirm_unknown_boq_is_not_found() {
        let (use_case, _) = use_case();
        let request = ConfirmMappingRequest {
            boq_id: 1234,
            column_mappings: HashMap::from([
                ("description".to_string(), 0),
                ("quantity".to_string(), 1),
                ("unit".to_string(), 2),
            ]),
        };
        let result = use_case.confirm(&request, CLEAN_CSV).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_header_only_file_warns_not_errors() {
        let (use_case, _) = use_case();
        let csv = b"Pos,Description,Qty,Unit\n";
        let result = use_case.upload("empty.csv", csv).await.unwrap();

        assert_eq!(result.total_rows_parsed, 0);
        assert!(result.preview_items.is_empty());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("No data rows")));
    }

    #[tokio::test]
    async fn test_bad_row_surfaces_in_warnings() {
        let (use_case, _) = use_case();
        let csv = b"Pos,Description,Qty,Unit\n1,Steel beam,abc,kg\n2,Concrete,5,m3\n";
        let result = use_case.upload("partial.csv", csv).await.unwrap();

        assert_eq!(result.total_rows_parsed, 2);
        assert!(result.preview_items[0].has_parsing_errors);
        assert!(!result.preview_items[1].has_parsing_errors);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("1 rows had parsing errors")));
    }

    #[tokio::test]
    async fn test_unsupported_extension_rejected() {
        let (use_case, _) = use_case();
        let result = use_case.upload("notes.pdf", b"whatever").await;
        assert!(matches!(result, Err(AppError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_preview_respects_limit() {
        let repo = Arc::new(InMemoryBoqRepository::new());
        let config = MappingConfig {
            preview_limit: 1,
            ..Default::default()
        };
        let use_case = BoqUploadUseCase::new(config, repo).unwrap();

        let result = use_case.upload("offer.csv", CLEAN_CSV).await.unwrap();
        assert_eq!(result.total_rows_parsed, 2);
        assert_eq!(result.preview_items.len(), 1);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("Preview limited")));
    }
}
