// ============================================================
// CONFIDENCE AGGREGATOR & CONFIRMATION GATE
// ============================================================
// Decide whether an auto-detected mapping may be trusted without a
// human in the loop. Low-confidence mappings are never silently
// accepted.

use crate::domain::boq::{ColumnMapping, TargetField};
use crate::domain::mapping_config::MappingConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct GateDecision {
    /// Minimum confidence among the required fields' mappings; a chain is
    /// as weak as its weakest required link.
    pub overall_confidence: f64,
    pub requires_confirmation: bool,
    /// Human-readable notes (unmapped optional fields, weak required
    /// fields), merged into the upload warnings.
    pub warnings: Vec<String>,
}

pub struct ConfirmationGate {
    config: MappingConfig,
}

impl ConfirmationGate {
    pub fn new(config: MappingConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, mappings: &[ColumnMapping], header_low_confidence: bool) -> GateDecision {
        let mut overall: f64 = 1.0;
        let mut required_unmapped = false;
        let mut warnings = Vec::new();

        for field in TargetField::REQUIRED {
            let mapping = mappings.iter().find(|m| m.target_field == field);
            match mapping {
                Some(m) if m.is_mapped() => {
                    overall = overall.min(m.confidence);
                    if m.confidence < self.config.acceptance_threshold {
                        warnings.push(format!(
                            "Low confidence ({:.0}%) mapping '{}' to required field '{}'",
                            m.confidence * 100.0,
                            m.detected_header,
                            field
                        ));
                    }
                }
                _ => {
                    overall = 0.0;
                    required_unmapped = true;
                    warnings.push(format!("No column found for required field '{}'", field));
                }
            }
        }

        for mapping in mappings {
            if !mapping.target_field.is_required() && !mapping.is_mapped() {
                warnings.push(format!(
                    "No column found for optional field '{}'",
                    mapping.target_field
                ));
            }
        }

        if header_low_confidence {
            warnings.push("Header row detection was low confidence".to_string());
        }

        let requires_confirmation = overall < self.config.acceptance_threshold
            || required_unmapped
            || header_low_confidence;

        GateDecision {
            overall_confidence: overall,
            requires_confirmation,
            warnings,
        }
    }
}
