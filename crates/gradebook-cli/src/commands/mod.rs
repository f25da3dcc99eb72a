// ABOUTME: Command implementations for the gradebook CLI
// ABOUTME: Submodules for build, check and show, plus the shared loading step

pub mod build;
pub mod check;
pub mod show;

use gradebook_lib::{Gradebook, GradebookConfig, Result, Warning};

/// Load config and workbook, printing each warning as soon as it is found.
/// Returns the gradebook and the number of warnings printed.
pub fn load_gradebook(
    config_arg: &str,
    merge: Option<&str>,
    verbose: bool,
) -> Result<(Gradebook, usize)> {
    let config = GradebookConfig::load_with_overrides(config_arg, merge)?;

    if verbose {
        println!("Processing gradebook {}", config.gradebook_file.display());
    }

    let mut warnings = 0;
    let gradebook = Gradebook::open(&config, &mut warning_printer(&mut warnings))?;

    if verbose {
        println!(
            "Loaded {} students from '{}' and {} categories",
            gradebook.students().len(),
            gradebook.roster_sheet(),
            gradebook.categories().len()
        );
    }

    Ok((gradebook, warnings))
}

/// Sink that prints each warning as it arrives and counts it
pub fn warning_printer(count: &mut usize) -> impl FnMut(Warning) + '_ {
    move |w: Warning| {
        *count += 1;
        println!("⚠️  WARNING: {w}");
    }
}
