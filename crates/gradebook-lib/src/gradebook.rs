// ABOUTME: Assembles the roster and every category sheet into a sealed Gradebook
// ABOUTME: GradebookBuilder is the mutable stage; Gradebook is the read-only result

use crate::category::load_category_sheet;
use crate::roster::{load_roster, Roster};
use crate::workbook::Workbook;
use crate::{Category, DiagnosticSink, GradebookConfig, GradebookError, Ident, Result, Student};
use std::fmt;

/// Pluggable grading policy supplied by the caller
pub trait GradeCalculator {
    /// Grade for a student, for one category or (with `None`) overall.
    /// `final_grade` asks for the end-of-term grade instead of a progress estimate.
    fn calc_grade(
        &self,
        student: &Student,
        category: Option<&Category>,
        final_grade: bool,
    ) -> Option<String>;
}

impl<F> GradeCalculator for F
where
    F: Fn(&Student, Option<&Category>, bool) -> Option<String>,
{
    fn calc_grade(
        &self,
        student: &Student,
        category: Option<&Category>,
        final_grade: bool,
    ) -> Option<String> {
        self(student, category, final_grade)
    }
}

/// Mutable stage of ingestion: the roster has been read and categories are
/// loaded one at a time.
pub struct GradebookBuilder {
    roster: Roster,
    categories: Vec<Category>,
    num_info_columns: usize,
    calculator: Option<Box<dyn GradeCalculator>>,
}

impl GradebookBuilder {
    /// Start from a loaded roster. `num_info_columns` is the number of leading
    /// roster-mirror columns on every category sheet.
    pub fn new(roster: Roster, num_info_columns: usize) -> Self {
        Self {
            roster,
            categories: Vec::new(),
            num_info_columns,
            calculator: None,
        }
    }

    /// Load the sheet named after `category` and keep the category
    pub fn load_category(
        &mut self,
        workbook: &Workbook,
        mut category: Category,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<()> {
        let sheet = workbook.sheet(category.sheet_name()).ok_or_else(|| {
            GradebookError::structural(format!(
                "Workbook has no worksheet named '{}' for category {}.",
                category.sheet_name(),
                category.title
            ))
        })?;
        let names = load_category_sheet(
            sheet,
            &category.key,
            &mut self.roster,
            self.num_info_columns,
            sink,
        )?;
        category.set_assignment_names(names);
        self.categories.push(category);
        Ok(())
    }

    /// Attach a grading policy
    pub fn with_calculator(mut self, calculator: impl GradeCalculator + 'static) -> Self {
        self.calculator = Some(Box::new(calculator));
        self
    }

    /// Seal the gradebook; nothing can change after this
    pub fn build(self) -> Gradebook {
        let (roster_sheet, display_names, info_keys, students) = self.roster.into_parts();
        let info_columns = info_keys
            .into_iter()
            .map(|(column, key)| {
                let title = display_names
                    .get(&column)
                    .cloned()
                    .unwrap_or_else(|| key.to_string());
                (key, title)
            })
            .collect();
        Gradebook {
            roster_sheet,
            info_columns,
            students,
            categories: self.categories,
            calculator: self.calculator,
        }
    }
}

/// Read-only students and categories of one workbook
pub struct Gradebook {
    roster_sheet: String,
    info_columns: Vec<(Ident, String)>,
    students: Vec<Student>,
    categories: Vec<Category>,
    calculator: Option<Box<dyn GradeCalculator>>,
}

impl fmt::Debug for Gradebook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gradebook")
            .field("roster_sheet", &self.roster_sheet)
            .field("info_columns", &self.info_columns)
            .field("students", &self.students.len())
            .field("categories", &self.categories)
            .finish_non_exhaustive()
    }
}

impl Gradebook {
    /// Open the workbook named in `config` and load it
    pub fn open(config: &GradebookConfig, sink: &mut dyn DiagnosticSink) -> Result<Self> {
        let workbook = Workbook::open(&config.gradebook_file)?;
        GradebookLoader::load(&workbook, config, sink)
    }

    /// Name of the roster sheet
    pub fn roster_sheet(&self) -> &str {
        &self.roster_sheet
    }

    /// Info keys with their display titles, in roster column order
    pub fn info_columns(&self) -> &[(Ident, String)] {
        &self.info_columns
    }

    /// All students in roster order, including inactive ones
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// Students still enrolled
    pub fn active_students(&self) -> impl Iterator<Item = &Student> {
        self.students.iter().filter(|s| s.active())
    }

    /// Categories in configuration order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category by key
    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// Student on a given roster row (1-based)
    pub fn student_by_row(&self, row_index: usize) -> Option<&Student> {
        self.students.iter().find(|s| s.row_index() == row_index)
    }

    /// First student whose info field `key` equals `value`
    pub fn find_student(&self, key: &str, value: &str) -> Option<&Student> {
        self.students
            .iter()
            .find(|s| s.info_value(key) == Some(value))
    }

    /// Grade from the attached calculator; `None` when there is none
    pub fn calc_grade(
        &self,
        student: &Student,
        category: Option<&Category>,
        final_grade: bool,
    ) -> Option<String> {
        self.calculator
            .as_ref()
            .and_then(|c| c.calc_grade(student, category, final_grade))
    }
}

/// Runs the roster loader once, then each category loader in order
pub struct GradebookLoader;

impl GradebookLoader {
    /// Load every configured category from `workbook`.
    ///
    /// Warnings stream to `sink`; the first fatal error aborts the load.
    pub fn load(
        workbook: &Workbook,
        config: &GradebookConfig,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Gradebook> {
        Ok(Self::builder(workbook, config, sink)?.build())
    }

    /// Like [`load`](Self::load), but stop before sealing so a calculator
    /// can be attached
    pub fn builder(
        workbook: &Workbook,
        config: &GradebookConfig,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<GradebookBuilder> {
        let roster_sheet = match &config.info_sheet_name {
            Some(name) => workbook.sheet(name).ok_or_else(|| {
                GradebookError::structural(format!("Unable to load info sheet with name '{name}'."))
            })?,
            None => workbook
                .first_sheet()
                .ok_or_else(|| GradebookError::structural("Workbook contains no sheets."))?,
        };

        let roster = load_roster(roster_sheet, sink)?;
        let num_info_columns = config
            .num_info_columns()
            .unwrap_or_else(|| roster.info_column_count());

        let mut builder = GradebookBuilder::new(roster, num_info_columns);
        for category in &config.categories {
            builder.load_category(workbook, category.clone(), sink)?;
        }
        Ok(builder)
    }
}
