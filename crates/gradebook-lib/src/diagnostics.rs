// ABOUTME: Non-fatal validation warnings and the sink they are streamed through
// ABOUTME: Loaders report each problem as soon as it is found; callers decide how to show it

use crate::mark::MarkProblem;
use crate::Ident;
use std::fmt;

/// A non-fatal problem found while reading the workbook.
///
/// Locations are spreadsheet addresses (`C7`) and row numbers are 1-based,
/// as a user sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A roster key has whitespace in it
    InfoKeyWhitespace { key: Ident },
    /// A roster key is not lowercase
    InfoKeyNotLowercase { key: Ident },
    /// Two roster columns declare the same key
    DuplicateInfoKey { key: Ident, location: String },
    /// A roster row has a blank first column and was skipped
    EmptyLeftColumn { row: usize },
    /// A roster cell under a declared key is missing or blank
    MissingInfoValue { key: Ident, row: usize },
    /// An assignment short name has whitespace in it
    AssignmentKeyWhitespace { sheet: String, key: Ident },
    /// A short name has no long name above it
    MissingLongName { sheet: String, key: Ident },
    /// An info column header on a category sheet is not a roster key
    UnknownInfoHeader {
        sheet: String,
        key: Ident,
        location: String,
    },
    /// An info column refers to a different roster column than its own
    ReferenceColumnMismatch {
        sheet: String,
        location: String,
        reference: String,
    },
    /// Data found in a column whose short name starts with `x`
    ExcludedColumnData {
        sheet: String,
        key: Ident,
        location: String,
    },
    /// Data found in a column with no short name
    DataWithoutShortName { sheet: String, location: String },
    /// An active student has no entry for an assignment
    GradeMissing {
        sheet: String,
        long_name: Option<String>,
        key: Ident,
        student: String,
        location: String,
    },
    /// A roster CSV field mapped to an info key is blank
    EmptyRosterField { key: Ident, line: u64 },
    /// A mark cell did not yield a mark
    BadMark {
        sheet: String,
        key: Ident,
        student: String,
        location: String,
        problem: MarkProblem,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InfoKeyWhitespace { key } => {
                write!(f, "Student info key '{key}' contains whitespace.")
            }
            Warning::InfoKeyNotLowercase { key } => {
                write!(f, "Student info key '{key}' is not lowercase.")
            }
            Warning::DuplicateInfoKey { key, location } => write!(
                f,
                "Student info key '{key}' is declared again in cell {location}; the later column is used."
            ),
            Warning::EmptyLeftColumn { row } => {
                write!(f, "Student info row {row} has empty left column.")
            }
            Warning::MissingInfoValue { key, row } => {
                write!(f, "Column for {key} in row {row} is empty.")
            }
            Warning::AssignmentKeyWhitespace { sheet, key } => {
                write!(f, "{sheet}: assignment key '{key}' contains whitespace.")
            }
            Warning::MissingLongName { sheet, key } => {
                write!(f, "{sheet}: assignment '{key}' has no long name.")
            }
            Warning::UnknownInfoHeader {
                sheet,
                key,
                location,
            } => write!(
                f,
                "{sheet}: info column header '{key}' in cell {location} is not a key on the info sheet."
            ),
            Warning::ReferenceColumnMismatch {
                sheet,
                location,
                reference,
            } => write!(
                f,
                "{sheet}: cell {location} refers to {reference}, which is a different info column."
            ),
            Warning::ExcludedColumnData {
                sheet,
                key,
                location,
            } => write!(
                f,
                "{sheet}: cell {location} has data, but column '{key}' is marked as unused."
            ),
            Warning::DataWithoutShortName { sheet, location } => write!(
                f,
                "There is grade data in cell {location} for {sheet}, but this column doesn't have a short name."
            ),
            Warning::GradeMissing {
                sheet,
                long_name,
                key,
                student,
                location,
            } => write!(
                f,
                "{sheet} {} ({key}) Grade missing for {student} (Cell {location})",
                long_name.as_deref().unwrap_or("")
            ),
            Warning::EmptyRosterField { key, line } => {
                write!(f, "Field {key} on roster line {line} is empty.")
            }
            Warning::BadMark {
                sheet,
                key,
                student,
                location,
                problem,
            } => write!(
                f,
                "{sheet} ({key}) grade for {student} in cell {location}: {problem}"
            ),
        }
    }
}

/// Receives warnings as they are discovered
pub trait DiagnosticSink {
    /// Report one warning
    fn warn(&mut self, warning: Warning);
}

impl<F: FnMut(Warning)> DiagnosticSink for F {
    fn warn(&mut self, warning: Warning) {
        self(warning)
    }
}

/// Sink that keeps every warning in order
#[derive(Debug, Default)]
pub struct WarningLog {
    warnings: Vec<Warning>,
}

impl WarningLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// All warnings, in the order they were reported
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Number of warnings recorded
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// Whether nothing was reported
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

impl DiagnosticSink for WarningLog {
    fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }
}
