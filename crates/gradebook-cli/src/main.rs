// ABOUTME: gradebook CLI entry point for checking and inspecting spreadsheet gradebooks
// ABOUTME: Provides subcommands: build, check, show

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gradebook CLI - Validate and inspect spreadsheet gradebooks
#[derive(Parser)]
#[command(name = "gradebook")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new gradebook workbook from the roster CSV
    Build {
        /// Config file path, or inline JSON starting with '{'
        config: String,
        /// JSON object whose top-level keys replace those in the config
        #[arg(long)]
        merge: Option<String>,
        /// Output file (defaults to the config's gradebookFile)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overwrite an existing output file, keeping a backup
        #[arg(short, long)]
        force: bool,
    },
    /// Load a gradebook and report every problem found
    Check {
        /// Config file path, or inline JSON starting with '{'
        config: String,
        /// JSON object whose top-level keys replace those in the config
        #[arg(long)]
        merge: Option<String>,
    },
    /// Load a gradebook and print assignments and marks
    Show {
        /// Config file path, or inline JSON starting with '{'
        config: String,
        /// JSON object whose top-level keys replace those in the config
        #[arg(long)]
        merge: Option<String>,
        /// Only show the student whose info field matches (e.g. github=leilaa)
        #[arg(long)]
        student: Option<String>,
        /// Include inactive students
        #[arg(long)]
        inactive: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build {
            config,
            merge,
            output,
            force,
        } => commands::build::run(&commands::build::BuildConfig {
            config,
            merge,
            output,
            force,
            verbose: cli.verbose,
        }),
        Commands::Check { config, merge } => commands::check::run(&commands::check::CheckConfig {
            config,
            merge,
            verbose: cli.verbose,
        }),
        Commands::Show {
            config,
            merge,
            student,
            inactive,
        } => commands::show::run(&commands::show::ShowConfig {
            config,
            merge,
            student,
            inactive,
            verbose: cli.verbose,
        }),
    };

    if let Err(e) = result {
        eprintln!("❌ {e}");
        std::process::exit(e.exit_code());
    }
}
