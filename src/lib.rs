//! Column-mapping and row-validation engine for supplier Bill of
//! Quantities spreadsheets.
//!
//! Given a raw cell grid with an unknown column layout, the engine
//! detects the header row, guesses which column feeds which semantic
//! field, scores its own confidence, and parses every data row into a
//! validated line item without letting one bad row abort the batch.
//! The two-call upload/confirm protocol keeps low-confidence mappings
//! behind an explicit operator decision.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::use_cases::boq_upload::{BoqUploadUseCase, ConfirmMappingRequest};
pub use domain::boq::{
    BillOfQuantities, BoqItem, BoqStatus, ColumnMapping, ParsedBoqItem, TargetField, UploadResult,
};
pub use domain::error::{AppError, Result};
pub use domain::grid::{CellGrid, CellValue};
pub use domain::mapping_config::MappingConfig;
pub use infrastructure::persistence::{BoqRepository, InMemoryBoqRepository};
