// ABOUTME: Read-only workbook model: sheets of rows of cells with values and formulas
// ABOUTME: Loaded from xlsx/xls/xlsb/ods files with calamine, or built in memory

use crate::{GradebookError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Duration, NaiveDate};
use regex_lite::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// One cell: its displayed value and, when present, the formula behind it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    /// Value as text; numbers are rendered the way a spreadsheet shows them
    pub value: Option<String>,
    /// Formula text without the leading `=`
    pub formula: Option<String>,
}

impl Cell {
    /// A plain value cell
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            formula: None,
        }
    }

    /// A formula cell with an optional cached value
    pub fn formula(formula: impl AsRef<str>, cached: Option<&str>) -> Self {
        let formula = formula.as_ref();
        Self {
            value: cached.map(str::to_string),
            formula: Some(formula.strip_prefix('=').unwrap_or(formula).to_string()),
        }
    }

    /// Trimmed value, or `None` when the cell is blank
    pub fn text(&self) -> Option<&str> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Target of the formula when the formula is a single cell reference
    pub fn reference(&self) -> Option<CellRef> {
        self.formula.as_deref().and_then(CellRef::parse)
    }
}

/// A reference such as `info!B7` or `'Roster 2023'!$A$3`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRef {
    /// Referenced sheet; `None` means the sheet the formula lives in
    pub sheet: Option<String>,
    /// 0-based column index
    pub column: usize,
    /// 1-based row number
    pub row: usize,
}

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^=?\s*(?:(?:'((?:[^']|'')+)'|([A-Za-z0-9_.]+))!)?\$?([A-Za-z]{1,3})\$?([0-9]+)\s*$")
            .expect("valid regex")
    })
}

impl CellRef {
    /// Parse a formula that consists of exactly one cell reference
    pub fn parse(formula: &str) -> Option<Self> {
        let caps = reference_pattern().captures(formula)?;
        let sheet = caps
            .get(1)
            .map(|m| m.as_str().replace("''", "'"))
            .or_else(|| caps.get(2).map(|m| m.as_str().to_string()));
        let column = column_index(caps.get(3)?.as_str())?;
        let row: usize = caps.get(4)?.as_str().parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Self { sheet, column, row })
    }
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "{sheet}!")?;
        }
        write!(f, "{}{}", column_name(self.column), self.row)
    }
}

/// Spreadsheet column letters for a 0-based index (0 → `A`, 26 → `AA`)
pub fn column_name(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// 0-based index for spreadsheet column letters (case-insensitive)
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut n = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        n = n * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(n - 1)
}

/// Spreadsheet address of a cell given 0-based row and column (`(2, 1)` → `B3`)
pub fn cell_location(row: usize, column: usize) -> String {
    format!("{}{}", column_name(column), row + 1)
}

/// One row; missing cells were never written
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<Option<Cell>>,
}

impl Row {
    /// Build a row of plain values; blank strings become missing cells
    pub fn from_values(values: &[&str]) -> Self {
        Self {
            cells: values
                .iter()
                .map(|v| (!v.is_empty()).then(|| Cell::value(*v)))
                .collect(),
        }
    }

    /// Cell at a 0-based column
    pub fn cell(&self, column: usize) -> Option<&Cell> {
        self.cells.get(column).and_then(Option::as_ref)
    }

    /// Trimmed text at a 0-based column, `None` when blank or missing
    pub fn text(&self, column: usize) -> Option<&str> {
        self.cell(column).and_then(Cell::text)
    }

    /// Number of cell slots, including trailing missing ones
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no cell slots
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether every cell is missing or blank
    pub fn is_blank(&self) -> bool {
        self.cells.iter().flatten().all(|c| c.text().is_none())
    }
}

/// A named worksheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    /// Rows by 0-based position; `None` for rows that were never written
    pub rows: Vec<Option<Row>>,
}

impl Sheet {
    /// Create an empty sheet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Build a sheet of plain values, one slice per row
    pub fn from_rows(name: impl Into<String>, rows: &[&[&str]]) -> Self {
        Self {
            name: name.into(),
            rows: rows.iter().map(|r| Some(Row::from_values(r))).collect(),
        }
    }

    /// Row at a 0-based position
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index).and_then(Option::as_ref)
    }

    /// Mutable access to a cell slot, growing the sheet as needed
    pub fn cell_mut(&mut self, row: usize, column: usize) -> &mut Option<Cell> {
        if self.rows.len() <= row {
            self.rows.resize(row + 1, None);
        }
        let row = self.rows[row].get_or_insert_with(Row::default);
        if row.cells.len() <= column {
            row.cells.resize(column + 1, None);
        }
        &mut row.cells[column]
    }

    /// Store a cell at the given 0-based position
    pub fn set_cell(&mut self, row: usize, column: usize, cell: Cell) {
        *self.cell_mut(row, column) = Some(cell);
    }

    /// Number of row slots
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the sheet has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// An ordered collection of sheets, leftmost first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Wrap already-built sheets
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Read every sheet of a spreadsheet file (xlsx, xls, xlsb, ods)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut workbook = open_workbook_auto(path).map_err(|e| {
            GradebookError::Spreadsheet(format!("Failed to open '{}': {e}", path.display()))
        })?;

        let names: Vec<String> = workbook.sheet_names().to_vec();
        let mut sheets = Vec::with_capacity(names.len());

        for name in &names {
            let range = workbook.worksheet_range(name).map_err(|e| {
                GradebookError::Spreadsheet(format!("Failed to read sheet '{name}': {e}"))
            })?;
            let mut sheet = Sheet::new(name.clone());

            let (start_row, start_col) = range.start().unwrap_or((0, 0));
            for (row_idx, row) in range.rows().enumerate() {
                for (col_idx, data) in row.iter().enumerate() {
                    if let Some(value) = data_to_text(data) {
                        sheet.set_cell(
                            start_row as usize + row_idx,
                            start_col as usize + col_idx,
                            Cell::value(value),
                        );
                    }
                }
            }

            // Formulas are optional: some formats cannot report them
            if let Ok(formulas) = workbook.worksheet_formula(name) {
                let (start_row, start_col) = formulas.start().unwrap_or((0, 0));
                for (row_idx, row) in formulas.rows().enumerate() {
                    for (col_idx, formula) in row.iter().enumerate() {
                        if formula.is_empty() {
                            continue;
                        }
                        let slot = sheet.cell_mut(
                            start_row as usize + row_idx,
                            start_col as usize + col_idx,
                        );
                        let cell = slot.get_or_insert_with(Cell::default);
                        cell.formula = Some(
                            formula
                                .strip_prefix('=')
                                .unwrap_or(formula)
                                .to_string(),
                        );
                    }
                }
            }

            sheets.push(sheet);
        }

        Ok(Self { sheets })
    }

    /// Sheet names, leftmost first
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// The leftmost sheet
    pub fn first_sheet(&self) -> Option<&Sheet> {
        self.sheets.first()
    }

    /// Sheet by exact name
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

fn data_to_text(data: &Data) -> Option<String> {
    match data {
        Data::Empty => None,
        Data::String(s) => (!s.is_empty()).then(|| s.clone()),
        Data::Float(n) => Some(if n.fract() == 0.0 && n.abs() < 1e15 {
            format!("{}", *n as i64)
        } else {
            format!("{n}")
        }),
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Some(format!("#{e:?}")),
        Data::DateTime(dt) => Some(serial_to_text(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

/// Render a 1900-system date serial as `YYYY-MM-DD`, adding `HH:MM:SS` when
/// the serial carries a time of day
fn serial_to_text(serial: f64) -> String {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return serial.to_string();
    };
    let days = serial.floor();
    let seconds = ((serial - days) * 86_400.0).round() as i64;
    let Some(timestamp) = epoch
        .and_hms_opt(0, 0, 0)
        .and_then(|t| t.checked_add_signed(Duration::days(days as i64)))
        .and_then(|t| t.checked_add_signed(Duration::seconds(seconds)))
    else {
        return serial.to_string();
    };
    if seconds == 0 {
        timestamp.format("%Y-%m-%d").to_string()
    } else {
        timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Excel serial number (1900 system) for a calendar date
pub fn date_serial(date: NaiveDate) -> f64 {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .map_or(0.0, |epoch| (date - epoch).num_days() as f64)
}
