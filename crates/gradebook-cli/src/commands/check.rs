// ABOUTME: 'gradebook check' command implementation
// ABOUTME: Loads the gradebook, streams warnings, and prints a one-line summary

use gradebook_lib::Result;

/// Configuration for check command
pub struct CheckConfig {
    pub config: String,
    pub merge: Option<String>,
    pub verbose: bool,
}

/// Validate a gradebook
pub fn run(config: &CheckConfig) -> Result<()> {
    let (gradebook, warnings) =
        super::load_gradebook(&config.config, config.merge.as_deref(), config.verbose)?;

    let active = gradebook.active_students().count();
    let assignments: usize = gradebook
        .categories()
        .iter()
        .map(|c| c.assignment_names().len())
        .sum();

    let icon = if warnings == 0 { "✅" } else { "⚠️ " };
    println!(
        "{icon} {} students ({active} active), {} categories, {assignments} assignments, {warnings} warning{}",
        gradebook.students().len(),
        gradebook.categories().len(),
        if warnings == 1 { "" } else { "s" }
    );

    if config.verbose {
        for category in gradebook.categories() {
            println!(
                "  {} ({}): {}",
                category.title,
                category.key,
                category
                    .assignment_names()
                    .iter()
                    .map(|(id, _)| id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }

    Ok(())
}
