// ABOUTME: Grading categories and the loader for their worksheets
// ABOUTME: Each category sheet mirrors the roster rows and holds one assignment per column

use crate::mark::parse_mark_cell;
use crate::roster::Roster;
use crate::workbook::{cell_location, Row, Sheet};
use crate::{DiagnosticSink, GradebookError, Ident, Result, Warning};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One grading category; its key is also the name of its worksheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub key: Ident,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_title: Option<String>,
    /// Report formatting hint; not interpreted here
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub category_type: Option<String>,
    /// Info columns hidden on this category's sheet
    #[serde(default)]
    pub hidden_info_columns: BTreeSet<Ident>,
    #[serde(skip)]
    assignment_names: Vec<(Ident, String)>,
}

impl Category {
    pub fn new(key: Ident, title: impl Into<String>) -> Self {
        Self {
            key,
            title: title.into(),
            short_title: None,
            category_type: None,
            hidden_info_columns: BTreeSet::new(),
            assignment_names: Vec::new(),
        }
    }

    /// Name of the worksheet holding this category
    pub fn sheet_name(&self) -> &str {
        self.key.as_str()
    }

    /// Assignment short names and long names, in column order.
    /// Empty until the category sheet has been loaded.
    pub fn assignment_names(&self) -> &[(Ident, String)] {
        &self.assignment_names
    }

    /// Long name of one assignment
    pub fn assignment_name(&self, assignment: &str) -> Option<&str> {
        self.assignment_names
            .iter()
            .find(|(id, _)| id == assignment)
            .map(|(_, name)| name.as_str())
    }

    pub(crate) fn set_assignment_names(&mut self, names: Vec<(Ident, String)>) {
        self.assignment_names = names;
    }
}

fn header_row<'a>(sheet: &'a Sheet, index: usize, label: &str) -> Result<&'a Row> {
    sheet.row(index).ok_or_else(|| {
        GradebookError::structural(format!(
            "Worksheet {} is missing the {label} header row (the row labeled {} in Excel).",
            sheet.name,
            index + 1
        ))
    })
}

/// Load one category sheet into the roster's students.
///
/// The first `num_info_columns` columns mirror the roster and are checked,
/// not read. Returns the assignment short name → long name mapping.
pub fn load_category_sheet(
    sheet: &Sheet,
    category: &Ident,
    roster: &mut Roster,
    num_info_columns: usize,
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<(Ident, String)>> {
    let long_row = header_row(sheet, 0, "Long Name")?;
    let short_row = header_row(sheet, 1, "Short Name")?;

    let long_names: Vec<Option<String>> = (0..long_row.len())
        .map(|c| long_row.text(c).map(str::to_string))
        .collect();
    let short_names: Vec<Option<Ident>> = (0..short_row.len())
        .map(|c| short_row.text(c).and_then(|t| Ident::new(t).ok()))
        .collect();

    for (column, key) in short_names.iter().enumerate() {
        let Some(key) = key else {
            continue;
        };
        if column < num_info_columns {
            if !roster.has_key(key.as_str()) {
                sink.warn(Warning::UnknownInfoHeader {
                    sheet: sheet.name.clone(),
                    key: key.clone(),
                    location: cell_location(1, column),
                });
            }
        } else if key.has_whitespace() {
            sink.warn(Warning::AssignmentKeyWhitespace {
                sheet: sheet.name.clone(),
                key: key.clone(),
            });
        }
    }

    check_alignment(sheet, roster.sheet_name(), num_info_columns, sink)?;

    for (index, row) in sheet.rows.iter().enumerate().skip(2) {
        let Some(row) = row else {
            continue;
        };
        if row.is_blank() {
            continue;
        }

        let row_number = index + 1;
        let Some(student) = roster.student_mut(row_number) else {
            return Err(GradebookError::structural(format!(
                "Info worksheet doesn't have a student on row {row_number} (found data on worksheet {}).",
                sheet.name
            )));
        };
        if !student.active() {
            continue;
        }

        let width = short_names.len().max(row.len());
        for column in num_info_columns..width {
            let value = row.text(column);
            let short_name = short_names.get(column).and_then(Option::as_ref);
            let location = cell_location(index, column);

            match (short_name, value) {
                (None, None) => {}
                (None, Some(_)) => sink.warn(Warning::DataWithoutShortName {
                    sheet: sheet.name.clone(),
                    location,
                }),
                (Some(key), value) if key.is_excluded() => {
                    if value.is_some() {
                        sink.warn(Warning::ExcludedColumnData {
                            sheet: sheet.name.clone(),
                            key: key.clone(),
                            location,
                        });
                    }
                }
                (Some(key), None) => sink.warn(Warning::GradeMissing {
                    sheet: sheet.name.clone(),
                    long_name: long_names.get(column).cloned().flatten(),
                    key: key.clone(),
                    student: student.full_name(),
                    location,
                }),
                (Some(key), Some(text)) => {
                    let record = parse_mark_cell(text);
                    if let Some(problem) = record.problem {
                        sink.warn(Warning::BadMark {
                            sheet: sheet.name.clone(),
                            key: key.clone(),
                            student: student.full_name(),
                            location,
                            problem,
                        });
                    }
                    student.set_mark(category, key, record.mark);
                    student.set_late_days(category, key, record.late);
                }
            }
        }
    }

    let mut assignment_names = Vec::new();
    for (column, key) in short_names.iter().enumerate().skip(num_info_columns) {
        let Some(key) = key else {
            continue;
        };
        if key.is_excluded() {
            continue;
        }
        match long_names.get(column).cloned().flatten() {
            Some(long_name) => assignment_names.push((key.clone(), long_name)),
            None => sink.warn(Warning::MissingLongName {
                sheet: sheet.name.clone(),
                key: key.clone(),
            }),
        }
    }

    Ok(assignment_names)
}

/// Info columns that are formula references must point at the same row of
/// the roster sheet.
fn check_alignment(
    sheet: &Sheet,
    roster_sheet: &str,
    num_info_columns: usize,
    sink: &mut dyn DiagnosticSink,
) -> Result<()> {
    for (index, row) in sheet.rows.iter().enumerate() {
        let Some(row) = row else {
            continue;
        };
        for column in 0..num_info_columns.min(row.len()) {
            let Some(reference) = row.cell(column).and_then(|c| c.reference()) else {
                continue;
            };
            let location = cell_location(index, column);
            if reference.sheet.as_deref() != Some(roster_sheet) || reference.row != index + 1 {
                return Err(GradebookError::structural(format!(
                    "Worksheet {} is out of alignment with {roster_sheet}: cell {location} refers to {reference}.",
                    sheet.name
                )));
            }
            if reference.column != column {
                sink.warn(Warning::ReferenceColumnMismatch {
                    sheet: sheet.name.clone(),
                    location,
                    reference: reference.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::load_roster;
    use crate::workbook::Cell;
    use crate::WarningLog;

    fn roster() -> Roster {
        let sheet = Sheet::from_rows(
            "info",
            &[
                &["Last Name", "First Name"],
                &["lname", "fname"],
                &["Anderson", "Leila"],
                &["xxDavis", "Maria"],
                &["Chen", "Wei"],
            ],
        );
        load_roster(&sheet, &mut WarningLog::new()).unwrap()
    }

    fn homework() -> Ident {
        Ident::new("homework").unwrap()
    }

    #[test]
    fn test_records_marks_and_late_days() {
        let sheet = Sheet::from_rows(
            "homework",
            &[
                &["Last Name", "First Name", "Homework 1", "Homework 2"],
                &["lname", "fname", "hw1", "hw2"],
                &["Anderson", "Leila", "m|2", "e;nice work"],
                &["xxDavis", "Maria", "m", "m"],
                &["Chen", "Wei", "p", "r | 1"],
            ],
        );
        let mut roster = roster();
        let mut log = WarningLog::new();
        let names = load_category_sheet(&sheet, &homework(), &mut roster, 2, &mut log).unwrap();

        assert!(log.is_empty(), "{:?}", log.warnings());
        let students = roster.students();
        assert_eq!(students[0].mark("homework", "hw1"), Some("m"));
        assert_eq!(students[0].late_days("homework", "hw1"), 2);
        assert_eq!(students[0].mark("homework", "hw2"), Some("e"));
        assert_eq!(students[0].late_days("homework", "hw2"), 0);
        assert_eq!(students[2].late_days("homework", "hw2"), 1);
        assert_eq!(
            names,
            vec![
                (Ident::new("hw1").unwrap(), "Homework 1".to_string()),
                (Ident::new("hw2").unwrap(), "Homework 2".to_string()),
            ]
        );
    }

    #[test]
    fn test_inactive_students_are_not_recorded() {
        let sheet = Sheet::from_rows(
            "homework",
            &[
                &["Last", "First", "HW 1"],
                &["lname", "fname", "hw1"],
                &["Anderson", "Leila", "m"],
                &["xxDavis", "Maria", "e"],
            ],
        );
        let mut roster = roster();
        load_category_sheet(&sheet, &homework(), &mut roster, 2, &mut WarningLog::new()).unwrap();
        assert_eq!(roster.students()[1].mark("homework", "hw1"), None);
        assert!(!roster.students()[1].has_entry("homework", "hw1"));
    }

    #[test]
    fn test_excluded_column_is_skipped_with_warning() {
        let sheet = Sheet::from_rows(
            "homework",
            &[
                &["Last", "First", "HW 1", "HW 2"],
                &["lname", "fname", "hw1", "xhw2"],
                &["Anderson", "Leila", "m|2", "e"],
            ],
        );
        let mut roster = roster();
        let mut log = WarningLog::new();
        let names = load_category_sheet(&sheet, &homework(), &mut roster, 2, &mut log).unwrap();

        assert_eq!(names.len(), 1);
        assert_eq!(names[0].0, "hw1");
        assert!(!roster.students()[0].has_entry("homework", "xhw2"));
        assert!(matches!(
            log.warnings(),
            [Warning::ExcludedColumnData { location, .. }] if location == "D3"
        ));
    }

    #[test]
    fn test_data_without_short_name_warns() {
        let sheet = Sheet::from_rows(
            "homework",
            &[
                &["Last", "First", "HW 1"],
                &["lname", "fname", "hw1"],
                &["Anderson", "Leila", "m", "stray"],
            ],
        );
        let mut roster = roster();
        let mut log = WarningLog::new();
        load_category_sheet(&sheet, &homework(), &mut roster, 2, &mut log).unwrap();
        assert!(matches!(
            log.warnings(),
            [Warning::DataWithoutShortName { location, .. }] if location == "D3"
        ));
    }

    #[test]
    fn test_missing_grade_warns_for_active_students_only() {
        let sheet = Sheet::from_rows(
            "homework",
            &[
                &["Last", "First", "HW 1", "HW 2"],
                &["lname", "fname", "hw1", "hw2"],
                &["Anderson", "Leila", "m", ""],
                &["xxDavis", "Maria", "m", ""],
            ],
        );
        let mut roster = roster();
        let mut log = WarningLog::new();
        load_category_sheet(&sheet, &homework(), &mut roster, 2, &mut log).unwrap();
        assert_eq!(log.len(), 1);
        match &log.warnings()[0] {
            Warning::GradeMissing {
                student,
                location,
                long_name,
                ..
            } => {
                assert_eq!(student, "Leila Anderson");
                assert_eq!(location, "D3");
                assert_eq!(long_name.as_deref(), Some("HW 2"));
            }
            other => panic!("unexpected warning {other:?}"),
        }
        assert!(!roster.students()[0].has_entry("homework", "hw2"));
    }

    #[test]
    fn test_bad_mark_still_records_late_days() {
        let sheet = Sheet::from_rows(
            "homework",
            &[
                &["Last", "First", "HW 1", "HW 2"],
                &["lname", "fname", "hw1", "hw2"],
                &["Anderson", "Leila", "|3", "m|five"],
            ],
        );
        let mut roster = roster();
        let mut log = WarningLog::new();
        load_category_sheet(&sheet, &homework(), &mut roster, 2, &mut log).unwrap();

        let student = &roster.students()[0];
        assert_eq!(student.mark("homework", "hw1"), None);
        assert!(student.has_entry("homework", "hw1"));
        assert_eq!(student.late_days("homework", "hw1"), 3);
        assert_eq!(student.mark("homework", "hw2"), None);
        assert_eq!(student.late_days("homework", "hw2"), 0);
        assert_eq!(log.len(), 2);
        assert!(log
            .warnings()
            .iter()
            .all(|w| matches!(w, Warning::BadMark { .. })));
    }

    #[test]
    fn test_row_without_student_is_fatal() {
        let sheet = Sheet::from_rows(
            "homework",
            &[
                &["Last", "First", "HW 1"],
                &["lname", "fname", "hw1"],
                &["Anderson", "Leila", "m"],
                &["", "", ""],
                &["", "", ""],
                &["", "", "m"],
            ],
        );
        let mut roster = roster();
        let err = load_category_sheet(&sheet, &homework(), &mut roster, 2, &mut WarningLog::new())
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Spreadsheet);
        assert!(err.to_string().contains("row 6"));
    }

    #[test]
    fn test_inactive_row_without_grades_is_accepted() {
        let sheet = Sheet::from_rows(
            "homework",
            &[
                &["Last", "First", "HW 1"],
                &["lname", "fname", "hw1"],
                &["Anderson", "Leila", "m"],
                &["xxDavis", "Maria", ""],
                &["Chen", "Wei", "e"],
            ],
        );
        let mut roster = roster();
        let mut log = WarningLog::new();
        load_category_sheet(&sheet, &homework(), &mut roster, 2, &mut log).unwrap();
        assert!(log.is_empty(), "{:?}", log.warnings());
    }

    #[test]
    fn test_unmatched_row_with_only_info_text_is_fatal() {
        let sheet = Sheet::from_rows(
            "homework",
            &[
                &["Last", "First", "HW 1"],
                &["lname", "fname", "hw1"],
                &["Anderson", "Leila", "m"],
                &["xxDavis", "Maria", ""],
                &["Chen", "Wei", "e"],
                &["Zed", "Zoe", ""],
            ],
        );
        let mut roster = roster();
        let mut log = WarningLog::new();
        let err = load_category_sheet(&sheet, &homework(), &mut roster, 2, &mut log).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Spreadsheet);
        assert!(err.to_string().contains("row 6"), "{err}");
        assert!(log.is_empty());

        let end_row = Sheet::from_rows(
            "homework",
            &[
                &["Last", "First", "HW 1"],
                &["lname", "fname", "hw1"],
                &["Anderson", "Leila", "m"],
                &["xxDavis", "Maria", ""],
                &["Chen", "Wei", "e"],
                &["END", "", ""],
            ],
        );
        assert!(
            load_category_sheet(&end_row, &homework(), &mut roster, 2, &mut WarningLog::new())
                .is_err()
        );
    }

    #[test]
    fn test_missing_header_rows_are_fatal() {
        let mut roster = roster();
        let empty = Sheet::new("homework");
        let err = load_category_sheet(&empty, &homework(), &mut roster, 2, &mut WarningLog::new())
            .unwrap_err();
        assert!(err.to_string().contains("Long Name"));

        let one_row = Sheet::from_rows("homework", &[&["Last", "First"]]);
        let err = load_category_sheet(&one_row, &homework(), &mut roster, 2, &mut WarningLog::new())
            .unwrap_err();
        assert!(err.to_string().contains("Short Name"));
    }

    #[test]
    fn test_missing_long_name_is_left_out_of_names() {
        let sheet = Sheet::from_rows(
            "homework",
            &[
                &["Last", "First", "", "HW 2"],
                &["lname", "fname", "hw1", "hw2"],
                &["Anderson", "Leila", "m", "m"],
            ],
        );
        let mut roster = roster();
        let mut log = WarningLog::new();
        let names = load_category_sheet(&sheet, &homework(), &mut roster, 2, &mut log).unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].0, "hw2");
        assert_eq!(roster.students()[0].mark("homework", "hw1"), Some("m"));
        assert!(matches!(log.warnings(), [Warning::MissingLongName { .. }]));
    }

    #[test]
    fn test_unknown_info_header_warns() {
        let sheet = Sheet::from_rows(
            "homework",
            &[
                &["Last", "Email", "HW 1"],
                &["lname", "email", "hw1"],
                &["Anderson", "la@example.com", "m"],
            ],
        );
        let mut roster = roster();
        let mut log = WarningLog::new();
        load_category_sheet(&sheet, &homework(), &mut roster, 2, &mut log).unwrap();
        assert!(matches!(
            log.warnings(),
            [Warning::UnknownInfoHeader { key, .. }] if key == "email"
        ));
    }

    #[test]
    fn test_aligned_references_pass() {
        let mut sheet = Sheet::from_rows(
            "homework",
            &[&["", "", "HW 1"], &["", "", "hw1"], &["", "", "m"]],
        );
        for row in 0..3 {
            for column in 0..2 {
                let formula = format!("info!{}", cell_location(row, column));
                sheet.set_cell(row, column, Cell::formula(formula, None));
            }
        }
        let mut roster = roster();
        let mut log = WarningLog::new();
        load_category_sheet(&sheet, &homework(), &mut roster, 2, &mut log).unwrap();
        assert!(log.is_empty());
        assert_eq!(roster.students()[0].mark("homework", "hw1"), Some("m"));
    }

    #[test]
    fn test_misaligned_reference_is_fatal() {
        let mut sheet = Sheet::from_rows(
            "homework",
            &[&["Last", "First", "HW 1"], &["lname", "fname", "hw1"], &["", "", "m"]],
        );
        sheet.set_cell(2, 0, Cell::formula("=info!A4", Some("xxDavis")));
        let mut roster = roster();
        let err = load_category_sheet(&sheet, &homework(), &mut roster, 2, &mut WarningLog::new())
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Spreadsheet);
        assert!(err.to_string().contains("A3"));
    }

    #[test]
    fn test_reference_to_other_column_warns() {
        let mut sheet = Sheet::from_rows(
            "homework",
            &[&["Last", "First", "HW 1"], &["lname", "fname", "hw1"], &["", "", "m"]],
        );
        sheet.set_cell(2, 0, Cell::formula("info!B3", Some("Leila")));
        let mut roster = roster();
        let mut log = WarningLog::new();
        load_category_sheet(&sheet, &homework(), &mut roster, 2, &mut log).unwrap();
        assert!(matches!(
            log.warnings(),
            [Warning::ReferenceColumnMismatch { .. }]
        ));
    }

    #[test]
    fn test_category_deserializes_from_config_json() {
        let category: Category = serde_json::from_str(
            r#"{"key": "homework", "title": "Homework", "shortTitle": "H",
                "type": "empn", "hiddenInfoColumns": ["github"]}"#,
        )
        .unwrap();
        assert_eq!(category.sheet_name(), "homework");
        assert_eq!(category.short_title.as_deref(), Some("H"));
        assert_eq!(category.category_type.as_deref(), Some("empn"));
        assert!(category.hidden_info_columns.contains("github"));
        assert!(category.assignment_names().is_empty());
    }
}
