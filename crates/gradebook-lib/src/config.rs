// ABOUTME: Gradebook configuration: workbook path, roster layout, and categories
// ABOUTME: Parsed from JSON, checked against an embedded JSON Schema, then checked semantically

use crate::{Category, GradebookError, Ident, Result};
use chrono::{Datelike, Duration, NaiveDate};
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// JSON Schema every configuration document must satisfy
pub const CONFIG_SCHEMA: &str = r#"{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "title": "Gradebook configuration",
    "type": "object",
    "required": ["gradebookFile", "categories"],
    "properties": {
        "gradebookFile": { "type": "string", "minLength": 1 },
        "infoSheetName": { "type": "string", "minLength": 1 },
        "rosterFile": { "type": "string", "minLength": 1 },
        "rosterConfig": {
            "type": "array",
            "items": { "type": ["string", "null"] }
        },
        "attendance": {
            "type": "object",
            "required": ["firstSunday", "lastSaturday", "meetingDays"],
            "properties": {
                "firstSunday": { "type": "string" },
                "lastSaturday": { "type": "string" },
                "meetingDays": { "type": "string", "minLength": 1 },
                "skipWeeks": { "type": "array", "items": { "type": "string" } },
                "skipDays": { "type": "array", "items": { "type": "string" } }
            }
        },
        "infoSheetConfig": {
            "type": "array",
            "items": {
                "type": "object",
                "required": ["key", "title"],
                "properties": {
                    "key": { "type": "string", "pattern": "\\S" },
                    "title": { "type": "string" }
                }
            }
        },
        "categories": {
            "type": "array",
            "minItems": 1,
            "items": {
                "type": "object",
                "required": ["key", "title"],
                "properties": {
                    "key": { "type": "string", "pattern": "\\S" },
                    "title": { "type": "string" },
                    "shortTitle": { "type": "string" },
                    "type": { "type": "string" },
                    "hiddenInfoColumns": {
                        "type": "array",
                        "items": { "type": "string" }
                    }
                }
            }
        }
    }
}"#;

/// Roster sheet name used when the config does not name one
pub const DEFAULT_INFO_SHEET: &str = "info";

/// Day letters for `meetingDays`, Sunday first
const DAY_LETTERS: &str = "umtwrfs";

/// One roster column: its key and its display title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoColumn {
    pub key: Ident,
    pub title: String,
}

impl InfoColumn {
    pub fn new(key: Ident, title: impl Into<String>) -> Self {
        Self {
            key,
            title: title.into(),
        }
    }
}

/// Class meeting calendar for the attendance sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceConfig {
    pub first_sunday: NaiveDate,
    pub last_saturday: NaiveDate,
    /// Day letters from `umtwrfs`, e.g. `mwf`
    pub meeting_days: String,
    /// Sundays starting weeks with no class
    #[serde(default)]
    pub skip_weeks: Vec<NaiveDate>,
    #[serde(default)]
    pub skip_days: Vec<NaiveDate>,
}

impl AttendanceConfig {
    fn weekdays(&self) -> Result<Vec<u32>> {
        self.meeting_days
            .to_lowercase()
            .chars()
            .map(|day| {
                DAY_LETTERS.find(day).map(|i| i as u32).ok_or_else(|| {
                    GradebookError::Config(format!(
                        "attendance meetingDays has unknown day '{day}' (expected letters from '{DAY_LETTERS}')"
                    ))
                })
            })
            .collect()
    }

    /// Class days from `first_sunday` through `last_saturday`, minus skipped
    /// days and weeks
    pub fn meeting_dates(&self) -> Result<Vec<NaiveDate>> {
        let weekdays = self.weekdays()?;
        let mut dates = Vec::new();
        let mut current = self.first_sunday;
        while current <= self.last_saturday {
            let offset = current.weekday().num_days_from_sunday();
            let week_start = current - Duration::days(i64::from(offset));
            if weekdays.contains(&offset)
                && !self.skip_days.contains(&current)
                && !self.skip_weeks.contains(&week_start)
            {
                dates.push(current);
            }
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }
        Ok(dates)
    }
}

/// Configuration for loading one gradebook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradebookConfig {
    /// Workbook to load; relative paths resolve against the config file
    pub gradebook_file: PathBuf,
    /// Roster sheet name; the leftmost sheet when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_sheet_name: Option<String>,
    /// Declared roster columns, in order
    #[serde(default)]
    pub info_sheet_config: Vec<InfoColumn>,
    /// Categories, in load and report order
    pub categories: Vec<Category>,
    /// Roster CSV used when building a new workbook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roster_file: Option<PathBuf>,
    /// Info key for each roster CSV column; `null` drops the column
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roster_config: Vec<Option<Ident>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendance: Option<AttendanceConfig>,
}

impl GradebookConfig {
    /// Load from a path, or from inline JSON when the argument starts with `{`
    pub fn load(arg: &str) -> Result<Self> {
        Self::load_with_overrides(arg, None)
    }

    /// Like [`load`](Self::load), with top-level keys replaced by `overrides`
    pub fn load_with_overrides(arg: &str, overrides: Option<&str>) -> Result<Self> {
        if arg.trim_start().starts_with('{') {
            Self::from_json_with_overrides(arg, overrides)
        } else {
            Self::from_file_with_overrides(arg, overrides)
        }
    }

    /// Load a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_with_overrides(path, None)
    }

    fn from_file_with_overrides(path: impl AsRef<Path>, overrides: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_with_overrides(&content, overrides)?;
        if let Some(dir) = path.parent() {
            if config.gradebook_file.is_relative() {
                config.gradebook_file = dir.join(&config.gradebook_file);
            }
            if let Some(roster) = config.roster_file.as_mut().filter(|p| p.is_relative()) {
                *roster = dir.join(&*roster);
            }
        }
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with_overrides(json, None)
    }

    fn from_json_with_overrides(json: &str, overrides: Option<&str>) -> Result<Self> {
        let mut document: Value = serde_json::from_str(json)?;
        if let Some(overrides) = overrides {
            merge(&mut document, serde_json::from_str(overrides)?)?;
        }
        validate_schema(&document)?;
        let config: Self = serde_json::from_value(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of leading info columns on each category sheet, when declared
    pub fn num_info_columns(&self) -> Option<usize> {
        (!self.info_sheet_config.is_empty()).then_some(self.info_sheet_config.len())
    }

    /// Category by key
    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// Roster sheet name, defaulting to `info`
    pub fn info_sheet(&self) -> &str {
        self.info_sheet_name.as_deref().unwrap_or(DEFAULT_INFO_SHEET)
    }

    /// Declared roster columns, or last and first name when none are declared
    pub fn info_columns(&self) -> Vec<InfoColumn> {
        if self.info_sheet_config.is_empty() {
            vec![
                InfoColumn::new(Ident::lname(), "Last Name"),
                InfoColumn::new(Ident::fname(), "First Name"),
            ]
        } else {
            self.info_sheet_config.clone()
        }
    }

    fn validate(&self) -> Result<()> {
        let mut info_keys = HashSet::new();
        for column in &self.info_sheet_config {
            if !info_keys.insert(column.key.as_str()) {
                return Err(GradebookError::Config(format!(
                    "info column '{}' is declared more than once",
                    column.key
                )));
            }
        }
        if !self.info_sheet_config.is_empty() {
            for required in [Ident::FNAME, Ident::LNAME] {
                if !info_keys.contains(required) {
                    return Err(GradebookError::Config(format!(
                        "infoSheetConfig must declare the '{required}' column"
                    )));
                }
            }
        }

        let mut category_keys = HashSet::new();
        for category in &self.categories {
            if !category_keys.insert(category.key.as_str()) {
                return Err(GradebookError::Config(format!(
                    "category '{}' is declared more than once",
                    category.key
                )));
            }
            if !info_keys.is_empty() {
                if let Some(hidden) = category
                    .hidden_info_columns
                    .iter()
                    .find(|k| !info_keys.contains(k.as_str()))
                {
                    return Err(GradebookError::Config(format!(
                        "category '{}' hides unknown info column '{hidden}'",
                        category.key
                    )));
                }
            }
        }

        let columns = self.info_columns();
        if let Some(key) = self
            .roster_config
            .iter()
            .flatten()
            .find(|k| !columns.iter().any(|c| c.key == **k))
        {
            return Err(GradebookError::Config(format!(
                "Key {key} found in rosterConfig but not in infoSheetConfig"
            )));
        }

        if let Some(attendance) = &self.attendance {
            attendance.weekdays()?;
            if attendance.last_saturday < attendance.first_sunday {
                return Err(GradebookError::Config(
                    "attendance lastSaturday comes before firstSunday".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Replace top-level keys of `document` with those of `overrides`
fn merge(document: &mut Value, overrides: Value) -> Result<()> {
    let Value::Object(overrides) = overrides else {
        return Err(GradebookError::Config(
            "config overrides must be a JSON object".to_string(),
        ));
    };
    let Value::Object(target) = document else {
        return Err(GradebookError::Config(
            "config must be a JSON object".to_string(),
        ));
    };
    for (key, value) in overrides {
        target.insert(key, value);
    }
    Ok(())
}

fn validate_schema(document: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(CONFIG_SCHEMA)?;
    let compiled = JSONSchema::compile(&schema)
        .map_err(|e| GradebookError::Internal(format!("config schema does not compile: {e}")))?;

    let result = compiled.validate(document);
    if let Err(errors) = result {
        let messages: Vec<String> = errors
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{path}: {e}")
                }
            })
            .collect();
        return Err(GradebookError::Config(messages.join("; ")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"{
        "gradebookFile": "grades.xlsx",
        "infoSheetName": "info",
        "infoSheetConfig": [
            { "key": "lname", "title": "Last Name" },
            { "key": "fname", "title": "First Name" },
            { "key": "github", "title": "GitHub" }
        ],
        "categories": [
            { "key": "learningObjectives", "title": "Learning Objectives", "shortTitle": "LO",
              "type": "empn", "hiddenInfoColumns": ["github"] },
            { "key": "homework", "title": "Homework", "shortTitle": "H" }
        ]
    }"#;

    fn config_error(json: &str) -> GradebookError {
        let err = GradebookConfig::from_json(json).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig, "{err}");
        err
    }

    #[test]
    fn test_parses_sample() {
        let config = GradebookConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.gradebook_file, PathBuf::from("grades.xlsx"));
        assert_eq!(config.info_sheet_name.as_deref(), Some("info"));
        assert_eq!(config.num_info_columns(), Some(3));
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.categories[0].key, "learningObjectives");
        assert_eq!(config.category("homework").unwrap().title, "Homework");
    }

    #[test]
    fn test_minimal_config() {
        let config = GradebookConfig::from_json(
            r#"{"gradebookFile": "g.xlsx", "categories": [{"key": "hw", "title": "HW"}]}"#,
        )
        .unwrap();
        assert_eq!(config.info_sheet_name, None);
        assert_eq!(config.num_info_columns(), None);
    }

    #[test]
    fn test_missing_gradebook_file() {
        let err = config_error(r#"{"categories": [{"key": "hw", "title": "HW"}]}"#);
        assert!(err.to_string().contains("gradebookFile"));
    }

    #[test]
    fn test_missing_categories() {
        let err = config_error(r#"{"gradebookFile": "g.xlsx"}"#);
        assert!(err.to_string().contains("categories"));
    }

    #[test]
    fn test_empty_categories() {
        config_error(r#"{"gradebookFile": "g.xlsx", "categories": []}"#);
    }

    #[test]
    fn test_category_without_title() {
        let err = config_error(
            r#"{"gradebookFile": "g.xlsx", "categories": [{"key": "hw", "shortTitle": "H"}]}"#,
        );
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_info_config_requires_names() {
        let err = config_error(
            r#"{"gradebookFile": "g.xlsx",
                "infoSheetConfig": [{"key": "lname", "title": "Last"}],
                "categories": [{"key": "hw", "title": "HW"}]}"#,
        );
        assert!(err.to_string().contains("fname"));
    }

    #[test]
    fn test_duplicate_category_keys() {
        config_error(
            r#"{"gradebookFile": "g.xlsx",
                "categories": [{"key": "hw", "title": "HW"}, {"key": "hw", "title": "Again"}]}"#,
        );
    }

    #[test]
    fn test_unknown_hidden_column() {
        let err = config_error(
            r#"{"gradebookFile": "g.xlsx",
                "infoSheetConfig": [{"key": "lname", "title": "L"}, {"key": "fname", "title": "F"}],
                "categories": [{"key": "hw", "title": "HW", "hiddenInfoColumns": ["major"]}]}"#,
        );
        assert!(err.to_string().contains("major"));
    }

    #[test]
    fn test_not_json_is_invalid_config() {
        config_error("categories = []");
    }

    #[test]
    fn test_overrides_replace_top_level_keys() {
        let config = GradebookConfig::load_with_overrides(
            SAMPLE,
            Some(r#"{"categories": [{"key": "projects", "title": "Projects"}]}"#),
        )
        .unwrap();
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.categories[0].key, "projects");

        let err =
            GradebookConfig::load_with_overrides(SAMPLE, Some(r#"{"categories": []}"#)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);

        let err = GradebookConfig::load_with_overrides(SAMPLE, Some("[1, 2]")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_from_file_resolves_relative_workbook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gradebook.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = GradebookConfig::load_with_overrides(
            path.to_str().unwrap(),
            Some(r#"{"rosterFile": "roster.csv"}"#),
        )
        .unwrap();
        assert_eq!(config.gradebook_file, dir.path().join("grades.xlsx"));
        assert_eq!(config.roster_file, Some(dir.path().join("roster.csv")));
    }

    #[test]
    fn test_defaults_for_building() {
        let config = GradebookConfig::from_json(
            r#"{"gradebookFile": "g.xlsx", "categories": [{"key": "hw", "title": "HW"}]}"#,
        )
        .unwrap();
        assert_eq!(config.info_sheet(), "info");
        let info_columns = config.info_columns();
        let keys: Vec<&str> = info_columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["lname", "fname"]);
        assert!(config.roster_config.is_empty());
        assert_eq!(config.attendance, None);
    }

    #[test]
    fn test_roster_config_keys_must_be_info_columns() {
        let config = GradebookConfig::load_with_overrides(
            SAMPLE,
            Some(r#"{"rosterFile": "roster.csv", "rosterConfig": ["lname", null, "fname", "github"]}"#),
        )
        .unwrap();
        assert_eq!(config.roster_config.len(), 4);
        assert_eq!(config.roster_config[1], None);

        let err = config_error(
            r#"{"gradebookFile": "g.xlsx", "rosterConfig": ["lname", "email"],
                "categories": [{"key": "hw", "title": "HW"}]}"#,
        );
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn test_attendance_calendar() {
        let config = GradebookConfig::load_with_overrides(
            SAMPLE,
            Some(
                r#"{"attendance": {"firstSunday": "2023-01-08", "lastSaturday": "2023-01-21",
                    "meetingDays": "MWF", "skipDays": ["2023-01-11"], "skipWeeks": ["2023-01-15"]}}"#,
            ),
        )
        .unwrap();
        let dates = config.attendance.unwrap().meeting_dates().unwrap();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2023, 1, 9).unwrap(),
                NaiveDate::from_ymd_opt(2023, 1, 13).unwrap(),
            ]
        );
    }

    #[test]
    fn test_attendance_rejects_bad_input() {
        let base = r#"{"gradebookFile": "g.xlsx", "categories": [{"key": "hw", "title": "HW"}],"#;
        let err = config_error(&format!(
            r#"{base} "attendance": {{"firstSunday": "2023-01-08", "lastSaturday": "2023-01-21", "meetingDays": "mxf"}}}}"#
        ));
        assert!(err.to_string().contains("'x'"));
        config_error(&format!(
            r#"{base} "attendance": {{"firstSunday": "2023-01-21", "lastSaturday": "2023-01-08", "meetingDays": "m"}}}}"#
        ));
        config_error(&format!(
            r#"{base} "attendance": {{"firstSunday": "January 8", "lastSaturday": "2023-01-21", "meetingDays": "m"}}}}"#
        ));
    }

    #[test]
    fn test_missing_file_is_invalid_parameter() {
        let err = GradebookConfig::load("/no/such/gradebook.json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }
}
