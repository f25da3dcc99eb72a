// ABOUTME: 'gradebook build' command implementation
// ABOUTME: Writes a fresh workbook from the roster CSV, backing up any file it replaces

use gradebook_lib::{build_workbook, GradebookConfig, GradebookError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Configuration for build command
pub struct BuildConfig {
    pub config: String,
    pub merge: Option<String>,
    pub output: Option<PathBuf>,
    pub force: bool,
    pub verbose: bool,
}

/// Build a new gradebook workbook
pub fn run(config: &BuildConfig) -> Result<()> {
    let gradebook_config =
        GradebookConfig::load_with_overrides(&config.config, config.merge.as_deref())?;
    let output = config
        .output
        .clone()
        .unwrap_or_else(|| gradebook_config.gradebook_file.clone());

    if output.exists() {
        if !config.force {
            return Err(GradebookError::InvalidParameter(format!(
                "Output file {} exists. Use --force to overwrite.",
                output.display()
            )));
        }
        let backup = backup_path(&output);
        std::fs::copy(&output, &backup)?;
        println!(
            "Overwriting output file by --force (previous copy saved as {}).",
            backup.display()
        );
    }

    if config.verbose {
        if let Some(roster) = &gradebook_config.roster_file {
            println!("Reading roster {}", roster.display());
        }
    }

    let mut warnings = 0;
    let summary = build_workbook(
        &gradebook_config,
        &output,
        &mut super::warning_printer(&mut warnings),
    )?;

    println!(
        "✅ Workbook written to {} ({} students, sheets: {})",
        output.display(),
        summary.students,
        summary.sheets.join(", ")
    );
    if warnings > 0 {
        println!("⚠️  {warnings} warning{}", if warnings == 1 { "" } else { "s" });
    }
    Ok(())
}

/// `grades.xlsx` → `grades.xlsx~`
fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push("~");
    PathBuf::from(name)
}
