// ABOUTME: Core library for loading spreadsheet gradebooks
// ABOUTME: Includes the workbook model and writer, mark parser, roster and category loaders, and config

pub mod category;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod gradebook;
pub mod ident;
pub mod mark;
pub mod roster;
pub mod student;
pub mod workbook;
pub mod writer;

pub use category::Category;
pub use config::{AttendanceConfig, GradebookConfig, InfoColumn};
pub use diagnostics::{DiagnosticSink, Warning, WarningLog};
pub use error::{ErrorKind, GradebookError};
pub use gradebook::{GradeCalculator, Gradebook, GradebookBuilder, GradebookLoader};
pub use ident::Ident;
pub use mark::{parse_mark_cell, MarkProblem, MarkRecord};
pub use roster::Roster;
pub use student::Student;
pub use workbook::{Cell, CellRef, Row, Sheet, Workbook};
pub use writer::{build_workbook, BuildSummary, RosterRecord};

/// Result type alias using [`GradebookError`]
pub type Result<T> = std::result::Result<T, GradebookError>;
