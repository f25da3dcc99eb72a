// ABOUTME: Student record: roster info plus per-category marks and late days
// ABOUTME: Marks are keyed by category key, then assignment short name

use crate::{GradebookError, Ident, Result};
use std::collections::HashMap;

/// Personal and grade data for one student.
///
/// `info` holds every key declared on the roster sheet, in column order.
/// A key whose cell was blank is kept with a `None` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    info: Vec<(Ident, Option<String>)>,
    row_index: usize,
    active: bool,
    marks: HashMap<Ident, HashMap<Ident, Option<String>>>,
    late_days: HashMap<Ident, HashMap<Ident, u32>>,
}

impl Student {
    /// Create a student; `fname` and `lname` must be declared keys
    pub fn new(info: Vec<(Ident, Option<String>)>, row_index: usize, active: bool) -> Result<Self> {
        for required in [Ident::FNAME, Ident::LNAME] {
            if !info.iter().any(|(key, _)| key == required) {
                return Err(GradebookError::internal(format!(
                    "required key {required} missing from student data (row {row_index})"
                )));
            }
        }
        Ok(Self {
            info,
            row_index,
            active,
            marks: HashMap::new(),
            late_days: HashMap::new(),
        })
    }

    /// All info fields in roster column order
    pub fn info(&self) -> &[(Ident, Option<String>)] {
        &self.info
    }

    /// Value of one info field; `None` when undeclared or blank
    pub fn info_value(&self, key: &str) -> Option<&str> {
        self.info
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn fname(&self) -> Option<&str> {
        self.info_value(Ident::FNAME)
    }

    pub fn lname(&self) -> Option<&str> {
        self.info_value(Ident::LNAME)
    }

    /// First and last name separated by a space
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.fname().unwrap_or_default(),
            self.lname().unwrap_or_default()
        )
    }

    /// 1-based row number shared by the roster and every category sheet
    pub fn row_index(&self) -> usize {
        self.row_index
    }

    pub fn active(&self) -> bool {
        self.active
    }

    /// Mark for an assignment; `None` when ungraded or invalid
    pub fn mark(&self, category: &str, assignment: &str) -> Option<&str> {
        self.marks
            .get(category)
            .and_then(|m| m.get(assignment))
            .and_then(|m| m.as_deref())
    }

    /// Late days for an assignment, 0 when nothing was recorded
    pub fn late_days(&self, category: &str, assignment: &str) -> u32 {
        self.late_days
            .get(category)
            .and_then(|m| m.get(assignment))
            .copied()
            .unwrap_or(0)
    }

    /// Whether a cell was recorded for this assignment, even an invalid one
    pub fn has_entry(&self, category: &str, assignment: &str) -> bool {
        self.marks
            .get(category)
            .is_some_and(|m| m.contains_key(assignment))
    }

    /// All recorded marks for a category
    pub fn marks_for(&self, category: &str) -> Option<&HashMap<Ident, Option<String>>> {
        self.marks.get(category)
    }

    pub(crate) fn set_mark(&mut self, category: &Ident, assignment: &Ident, mark: Option<String>) {
        self.marks
            .entry(category.clone())
            .or_default()
            .insert(assignment.clone(), mark);
    }

    pub(crate) fn set_late_days(&mut self, category: &Ident, assignment: &Ident, late: Option<u32>) {
        self.late_days
            .entry(category.clone())
            .or_default()
            .insert(assignment.clone(), late.unwrap_or(0));
    }
}
