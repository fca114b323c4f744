use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    /// No row in the scanned window qualified as a header row. The whole
    /// file is rejected; there is no partial result.
    NoHeaderFound,
    /// The uploaded bytes are not a spreadsheet format we can read.
    UnsupportedFormat(String),
    /// Operator-supplied column mapping is invalid (unknown field, index
    /// out of range, duplicated column, missing required field).
    BadMapping(String),
    /// The grid exceeds the configured row cap.
    SizeLimit(String),
    Internal(String),
    NotFound(String),
    ValidationError(String),
    ParseError(String),
    IoError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NoHeaderFound => write!(f, "No header row found in file"),
            AppError::UnsupportedFormat(msg) => write!(f, "Unsupported file format: {}", msg),
            AppError::BadMapping(msg) => write!(f, "Bad column mapping: {}", msg),
            AppError::SizeLimit(msg) => write!(f, "Size limit exceeded: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
