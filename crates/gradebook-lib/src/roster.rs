// ABOUTME: Loads the roster (info) sheet into Student records
// ABOUTME: Row 1 holds display names, row 2 holds info keys, later rows hold one student each

use crate::workbook::{cell_location, Sheet};
use crate::{DiagnosticSink, GradebookError, Ident, Result, Student, Warning};
use std::collections::BTreeMap;

/// Text in the first column that ends the roster
pub const END_MARKER: &str = "END";

/// Prefix in the first column that marks a withdrawn student
pub const INACTIVE_PREFIX: &str = "xx";

/// Students and column layout read from the roster sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    sheet_name: String,
    display_names: BTreeMap<usize, String>,
    info_keys: BTreeMap<usize, Ident>,
    students: Vec<Student>,
}

impl Roster {
    /// Name of the sheet the roster was read from
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Row-1 display names by 0-based column
    pub fn display_names(&self) -> &BTreeMap<usize, String> {
        &self.display_names
    }

    /// Info keys by 0-based column
    pub fn info_keys(&self) -> &BTreeMap<usize, Ident> {
        &self.info_keys
    }

    /// Whether the roster declares this info key
    pub fn has_key(&self, key: &str) -> bool {
        self.info_keys.values().any(|k| k == key)
    }

    /// Number of leading columns spanned by info keys
    pub fn info_column_count(&self) -> usize {
        self.info_keys.keys().next_back().map_or(0, |c| c + 1)
    }

    /// Students in roster order
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// Student whose roster row is `row_index` (1-based)
    pub fn student_mut(&mut self, row_index: usize) -> Option<&mut Student> {
        let pos = self
            .students
            .binary_search_by_key(&row_index, Student::row_index)
            .ok()?;
        self.students.get_mut(pos)
    }

    pub(crate) fn into_parts(self) -> (String, BTreeMap<usize, String>, BTreeMap<usize, Ident>, Vec<Student>) {
        (
            self.sheet_name,
            self.display_names,
            self.info_keys,
            self.students,
        )
    }
}

/// Read the roster sheet.
///
/// Blank-first-column rows are skipped with a warning; an `END` row stops
/// reading. Rows are stored in ascending row order.
pub fn load_roster(sheet: &Sheet, sink: &mut dyn DiagnosticSink) -> Result<Roster> {
    let display_names = sheet
        .row(0)
        .map(|row| {
            (0..row.len())
                .filter_map(|c| row.text(c).map(|t| (c, t.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let key_row = sheet.row(1).ok_or_else(|| {
        GradebookError::structural(format!(
            "Worksheet {} is missing the info key header row (the row labeled 2).",
            sheet.name
        ))
    })?;

    let mut info_keys: BTreeMap<usize, Ident> = BTreeMap::new();
    for column in 0..key_row.len() {
        let Some(text) = key_row.text(column) else {
            continue;
        };
        let key = Ident::new(text)?;
        if key.has_whitespace() {
            sink.warn(Warning::InfoKeyWhitespace { key: key.clone() });
        }
        if !key.is_lowercase() {
            sink.warn(Warning::InfoKeyNotLowercase { key: key.clone() });
        }
        if let Some(previous) = info_keys
            .iter()
            .find(|(_, k)| **k == key)
            .map(|(c, _)| *c)
        {
            sink.warn(Warning::DuplicateInfoKey {
                key: key.clone(),
                location: cell_location(1, column),
            });
            info_keys.remove(&previous);
        }
        info_keys.insert(column, key);
    }

    let mut students = Vec::new();
    for (index, row) in sheet.rows.iter().enumerate().skip(2) {
        let Some(row) = row else {
            continue;
        };
        let row_number = index + 1;

        let Some(left) = row.text(0) else {
            sink.warn(Warning::EmptyLeftColumn { row: row_number });
            continue;
        };
        if left == END_MARKER {
            break;
        }
        let active = !left.starts_with(INACTIVE_PREFIX);

        let info = info_keys
            .iter()
            .map(|(&column, key)| {
                let value = row.text(column).map(str::to_string);
                if value.is_none() {
                    sink.warn(Warning::MissingInfoValue {
                        key: key.clone(),
                        row: row_number,
                    });
                }
                (key.clone(), value)
            })
            .collect();

        students.push(Student::new(info, row_number, active)?);
    }

    Ok(Roster {
        sheet_name: sheet.name.clone(),
        display_names,
        info_keys,
        students,
    })
}
