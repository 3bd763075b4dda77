//! Batch grading of menu-exercise submissions.
//!
//! Grades every submission in a directory, writes per-submission reports and
//! a cumulative `grades.csv`, and summarizes previous runs.

mod batch;
mod cli;
mod exit_codes;
mod summary;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "gradebook",
    version,
    about = "Grade a batch of menu-exercise submissions"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Grade every submission in DIR.
    Run {
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Config file (defaults to DIR/grader.toml).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the per-submission execution timeout.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Print the configured rubric.
    Rubric {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Aggregate the grade.json files of a previous run.
    Report {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Remove per-submission report folders and the ledger.
    Clean {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

fn main() {
    grader::logging::init();
    let code = match run() {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{err:#}");
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            dir,
            config,
            timeout_secs,
        } => cli::run_batch(&dir, config.as_deref(), timeout_secs),
        Command::Rubric { config } => cli::print_rubric(config.as_deref()),
        Command::Report { dir } => cli::report(&dir),
        Command::Clean { dir } => cli::clean(&dir),
    }
}
