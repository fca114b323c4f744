pub mod use_cases;

pub use use_cases::boq_upload::{BoqUploadUseCase, ConfirmMappingRequest};
pub use use_cases::column_mapper::ColumnMapper;
pub use use_cases::confirmation::ConfirmationGate;
pub use use_cases::header_detector::HeaderDetector;
pub use use_cases::row_parser::RowParser;
