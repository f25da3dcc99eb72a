// ABOUTME: Error types for gradebook ingestion
// ABOUTME: Defines GradebookError and the ErrorKind tiers used to pick exit statuses

use thiserror::Error;

/// Errors that abort gradebook ingestion.
///
/// Non-fatal problems are never reported through this type; they are streamed
/// as [`Warning`](crate::Warning)s through a [`DiagnosticSink`](crate::DiagnosticSink).
#[derive(Error, Debug)]
pub enum GradebookError {
    /// I/O error reading configuration or workbook files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error in a configuration document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The roster CSV could not be read
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The workbook file could not be opened or a sheet could not be read
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// A new workbook could not be written
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// A command-line argument cannot be used as given
    #[error("{0}")]
    InvalidParameter(String),

    /// Configuration is syntactically valid JSON but violates the config rules
    #[error("Invalid config: {0}")]
    Config(String),

    /// The workbook does not have the structure ingestion depends on
    /// (missing header rows, missing sheets, rows out of alignment)
    #[error("{0}")]
    Structural(String),

    /// A caller broke an internal contract (a defect, not bad input)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`GradebookError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad command-line input, including an unreadable config path
    InvalidParameter,
    /// The configuration document is malformed or incomplete
    InvalidConfig,
    /// The workbook is unreadable or structurally broken
    Spreadsheet,
    /// Defect in the surrounding code
    Internal,
}

impl ErrorKind {
    /// Process exit status for this kind of failure
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::InvalidParameter => 4,
            ErrorKind::InvalidConfig => 8,
            ErrorKind::Spreadsheet => 16,
            ErrorKind::Internal => 32,
        }
    }
}

impl GradebookError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GradebookError::Io(_) | GradebookError::Csv(_) | GradebookError::InvalidParameter(_) => {
                ErrorKind::InvalidParameter
            }
            GradebookError::Json(_) | GradebookError::Config(_) => ErrorKind::InvalidConfig,
            GradebookError::Spreadsheet(_)
            | GradebookError::Xlsx(_)
            | GradebookError::Structural(_) => ErrorKind::Spreadsheet,
            GradebookError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    pub(crate) fn structural(msg: impl Into<String>) -> Self {
        GradebookError::Structural(msg.into())
    }

    pub(crate) fn internal(msg: impl Into<String>) -> Self {
        GradebookError::Internal(msg.into())
    }
}
