// ABOUTME: Builds a new gradebook workbook from a roster CSV and the gradebook config
// ABOUTME: Category sheets mirror the info sheet through locked, row-aligned formulas

use crate::config::{AttendanceConfig, InfoColumn};
use crate::workbook::{cell_location, date_serial};
use crate::{DiagnosticSink, GradebookConfig, GradebookError, Ident, Result, Warning};
use rust_xlsxwriter::{Format, FormatBorder, Formula, ProtectionOptions, Workbook, Worksheet};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Last column index in an xlsx worksheet
const MAX_COLUMN: u16 = 16_383;

/// Key of the generated attendance sheet
pub const ATTENDANCE_SHEET: &str = "attendance";

/// Info columns hidden on the attendance sheet when declared
const ATTENDANCE_HIDDEN: [&str; 3] = ["username", "github", "major"];

/// One student read from the roster CSV
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRecord {
    /// Line of the record in the CSV file
    pub line: u64,
    /// Non-blank values by info key
    pub values: HashMap<Ident, String>,
}

impl RosterRecord {
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// What [`build_workbook`] wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub students: usize,
    /// Sheet names, leftmost first
    pub sheets: Vec<String>,
}

/// Read a roster CSV with a header row.
///
/// `columns[i]` names the info key for CSV column `i`; `None` skips it.
pub fn read_roster(
    path: &Path,
    columns: &[Option<Ident>],
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<RosterRecord>> {
    let content = std::fs::read_to_string(path)?;
    parse_roster(&content, columns, sink)
}

/// Parse roster CSV text; see [`read_roster`]
pub fn parse_roster(
    text: &str,
    columns: &[Option<Ident>],
    sink: &mut dyn DiagnosticSink,
) -> Result<Vec<RosterRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let mut values = HashMap::new();
        for (index, key) in columns.iter().enumerate() {
            let Some(key) = key else {
                continue;
            };
            match record.get(index).map(str::trim).filter(|v| !v.is_empty()) {
                Some(value) => {
                    values.insert(key.clone(), value.to_string());
                }
                None => sink.warn(Warning::EmptyRosterField {
                    key: key.clone(),
                    line,
                }),
            }
        }
        records.push(RosterRecord { line, values });
    }
    Ok(records)
}

/// Read the configured roster CSV and write a fresh workbook to `output`
pub fn build_workbook(
    config: &GradebookConfig,
    output: &Path,
    sink: &mut dyn DiagnosticSink,
) -> Result<BuildSummary> {
    let roster_file = config.roster_file.as_deref().ok_or_else(|| {
        GradebookError::Config("Config must include a rosterFile item.".to_string())
    })?;
    if config.roster_config.is_empty() {
        return Err(GradebookError::Config(
            "Config must include a rosterConfig item specifying the columns of the roster file."
                .to_string(),
        ));
    }
    let students = read_roster(roster_file, &config.roster_config, sink)?;
    write_workbook(config, &students, output)
}

/// Write the info sheet, one sheet per category, and the attendance sheet
/// when configured
pub fn write_workbook(
    config: &GradebookConfig,
    students: &[RosterRecord],
    output: &Path,
) -> Result<BuildSummary> {
    let columns = config.info_columns();
    let info_sheet = config.info_sheet();
    let grid = info_grid(&columns, students);

    let mut book = Workbook::new();
    let mut sheets = Vec::new();

    let info = book.add_worksheet();
    info.set_name(info_sheet)?;
    for (r, values) in grid.iter().enumerate() {
        for (c, value) in values.iter().enumerate() {
            if !value.is_empty() {
                info.write_string(r as u32, c as u16, value)?;
            }
        }
    }
    sheets.push(info_sheet.to_string());

    for category in &config.categories {
        add_grade_sheet(
            &mut book,
            category.sheet_name(),
            info_sheet,
            &columns,
            &category.hidden_info_columns,
            &grid,
        )?;
        sheets.push(category.sheet_name().to_string());
    }

    if let Some(attendance) = &config.attendance {
        add_attendance_sheet(&mut book, info_sheet, &columns, &grid, attendance)?;
        sheets.push(ATTENDANCE_SHEET.to_string());
    }

    book.save(output)?;
    Ok(BuildSummary {
        students: students.len(),
        sheets,
    })
}

/// Info sheet contents: titles, keys, then one row per student
fn info_grid(columns: &[InfoColumn], students: &[RosterRecord]) -> Vec<Vec<String>> {
    let mut grid = vec![
        columns.iter().map(|c| c.title.clone()).collect(),
        columns.iter().map(|c| c.key.to_string()).collect(),
    ];
    for student in students {
        grid.push(
            columns
                .iter()
                .map(|c| student.value(c.key.as_str()).unwrap_or_default().to_string())
                .collect(),
        );
    }
    grid
}

/// `info!` or `'Roster 2023'!`
fn sheet_prefix(name: &str) -> String {
    if name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        format!("{name}!")
    } else {
        format!("'{}'!", name.replace('\'', "''"))
    }
}

fn add_grade_sheet<'a>(
    book: &'a mut Workbook,
    name: &str,
    info_sheet: &str,
    columns: &[InfoColumn],
    hidden: &BTreeSet<Ident>,
    grid: &[Vec<String>],
) -> Result<&'a mut Worksheet> {
    let locked = Format::new().set_locked();
    let unlocked = Format::new().set_unlocked();
    let prefix = sheet_prefix(info_sheet);

    let sheet = book.add_worksheet();
    sheet.set_name(name)?;

    for (r, values) in grid.iter().enumerate() {
        for (c, value) in values.iter().enumerate() {
            let formula =
                Formula::new(format!("={prefix}{}", cell_location(r, c))).set_result(value);
            sheet.write_formula_with_format(r as u32, c as u16, formula, &locked)?;
        }
    }

    for (c, column) in columns.iter().enumerate() {
        if hidden.contains(&column.key) {
            sheet.set_column_hidden(c as u16)?;
        }
    }

    let info_width = columns.len() as u16;
    sheet.set_column_range_format(info_width, MAX_COLUMN, &unlocked)?;
    sheet.protect_with_options(&ProtectionOptions {
        format_cells: true,
        format_columns: true,
        insert_columns: true,
        delete_columns: true,
        insert_rows: true,
        delete_rows: true,
        ..ProtectionOptions::new()
    });
    sheet.set_freeze_panes(2, info_width)?;
    Ok(sheet)
}

fn add_attendance_sheet(
    book: &mut Workbook,
    info_sheet: &str,
    columns: &[InfoColumn],
    grid: &[Vec<String>],
    attendance: &AttendanceConfig,
) -> Result<()> {
    let hidden: BTreeSet<Ident> = columns
        .iter()
        .filter(|c| ATTENDANCE_HIDDEN.contains(&c.key.as_str()))
        .map(|c| c.key.clone())
        .collect();
    let dates = attendance.meeting_dates()?;
    let sheet = add_grade_sheet(book, ATTENDANCE_SHEET, info_sheet, columns, &hidden, grid)?;

    let date_format = Format::new().set_num_format("d-mmm-yy").set_unlocked();
    let first_row = Format::new()
        .set_border_left(FormatBorder::Thin)
        .set_unlocked();
    let later_rows = first_row.clone().set_border_top(FormatBorder::Thin);

    for (offset, date) in dates.into_iter().enumerate() {
        let column = (columns.len() + offset) as u16;
        sheet.write_number_with_format(1, column, date_serial(date), &date_format)?;
        for row in 2..grid.len() {
            let format = if row == 2 { &first_row } else { &later_rows };
            sheet.write_blank(row as u32, column, format)?;
        }
    }
    Ok(())
}
