// ABOUTME: 'gradebook show' command implementation
// ABOUTME: Prints each category's assignments and every student's marks and late days

use gradebook_lib::{Category, Gradebook, GradebookError, Result, Student};

/// Configuration for show command
pub struct ShowConfig {
    pub config: String,
    pub merge: Option<String>,
    pub student: Option<String>,
    pub inactive: bool,
    pub verbose: bool,
}

/// Print the loaded marks
pub fn run(config: &ShowConfig) -> Result<()> {
    let (gradebook, _) =
        super::load_gradebook(&config.config, config.merge.as_deref(), config.verbose)?;

    let students: Vec<&Student> = match &config.student {
        Some(filter) => {
            let (key, value) = filter.split_once('=').ok_or_else(|| {
                GradebookError::Config(format!(
                    "--student expects KEY=VALUE (e.g. github=leilaa), got '{filter}'"
                ))
            })?;
            match gradebook.find_student(key.trim(), value.trim()) {
                Some(student) => vec![student],
                None => {
                    println!("❌ No student with {key}={value}");
                    return Ok(());
                }
            }
        }
        None => gradebook
            .students()
            .iter()
            .filter(|s| config.inactive || s.active())
            .collect(),
    };

    for student in students {
        print_student(&gradebook, student);
    }

    Ok(())
}

fn print_student(gradebook: &Gradebook, student: &Student) {
    let status = if student.active() { "" } else { " (inactive)" };
    println!("📋 {}{status}", student.full_name());
    for (key, title) in gradebook.info_columns() {
        if let Some(value) = student.info_value(key.as_str()) {
            println!("  {title}: {value}");
        }
    }
    for category in gradebook.categories() {
        print_category(category, student);
    }
    println!();
}

fn print_category(category: &Category, student: &Student) {
    println!("  {}", category.title);
    for (id, long_name) in category.assignment_names() {
        let key = category.key.as_str();
        let mark = student.mark(key, id.as_str()).unwrap_or("-");
        let late = student.late_days(key, id.as_str());
        if late > 0 {
            println!("    {id:<12} {mark:<8} ({late} late) {long_name}");
        } else {
            println!("    {id:<12} {mark:<8} {long_name}");
        }
    }
}
