use std::path::PathBuf;

use thiserror::Error;

/// mitra-report error types
#[derive(Error, Debug)]
pub enum ReportError {
    /// Wrong arguments, unknown report or mode
    #[error("{0}")]
    Usage(String),

    /// Input JSON file does not exist
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// A mandatory dataset was present but empty
    #[error("{0}")]
    EmptyDataset(String),

    /// Failed to decode the input document
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Workbook could not be written
    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

impl ReportError {
    /// Extra hint shown next to the error message in the failure line
    pub fn details(&self) -> Option<&'static str> {
        match self {
            Self::EmptyDataset(msg) if msg.contains("mitra") => Some(
                "Please ensure mitra data is available before generating the report.",
            ),
            Self::EmptyDataset(msg) if msg.contains("performance") => Some(
                "Please ensure performance data is available before generating the report.",
            ),
            Self::EmptyDataset(msg) if msg.contains("status") => Some(
                "Please ensure status data is available before generating the report.",
            ),
            Self::EmptyDataset(_) => Some(
                "Please ensure delivery data is available before generating the report.",
            ),
            _ => None,
        }
    }
}

/// Result type alias for mitra-report
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReportError::Parse("invalid json".into());
        assert_eq!(err.to_string(), "parse error: invalid json");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ReportError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }

    #[test]
    fn test_input_not_found_display() {
        let err = ReportError::InputNotFound(PathBuf::from("/tmp/missing.json"));
        assert_eq!(err.to_string(), "Input file not found: /tmp/missing.json");
    }

    #[test]
    fn test_empty_dataset_keeps_message_verbatim() {
        let err = ReportError::EmptyDataset("No mitra data available.".into());
        assert_eq!(err.to_string(), "No mitra data available.");
        assert!(err.details().unwrap().contains("mitra data"));
    }

    #[test]
    fn test_details_follow_dataset() {
        let performance = ReportError::EmptyDataset("No performance data available.".into());
        assert!(performance.details().unwrap().contains("performance data"));
        let status = ReportError::EmptyDataset("No status data available.".into());
        assert!(status.details().unwrap().contains("status data"));
        let shipments = ReportError::EmptyDataset("No shipment data available.".into());
        assert!(shipments.details().unwrap().contains("delivery data"));
    }

    #[test]
    fn test_details_absent_for_other_errors() {
        assert!(ReportError::Usage("bad".into()).details().is_none());
    }
}
