//! safe-migrate — make a migration script safe to re-run
//!
//! # Usage
//!
//! ```bash
//! # manual_migration.sql -> safe_migration.sql
//! safe-migrate
//!
//! # Explicit paths
//! safe-migrate prisma/migrations/0001_init/migration.sql out.sql
//!
//! # Show what was rewritten
//! safe-migrate --report table
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::*;
use safe_migrate::prelude::*;

#[derive(Parser)]
#[command(name = "safe-migrate")]
#[command(version)]
#[command(about = "🛡 Rewrite PostgreSQL migrations so they can run twice", long_about = None)]
#[command(after_help = "EXAMPLES:
    safe-migrate
    safe-migrate schema.sql schema.safe.sql
    safe-migrate --config ci/safe-migrate.toml --report json")]
struct Cli {
    /// Migration script to read [default: manual_migration.sql]
    input: Option<PathBuf>,

    /// Where to write the idempotent script [default: safe_migration.sql]
    output: Option<PathBuf>,

    /// Config file (./safe-migrate.toml is used when present)
    #[arg(short, long, env = "SAFE_MIGRATE_CONFIG")]
    config: Option<PathBuf>,

    /// Print the list of recognized statements
    #[arg(short, long, value_enum)]
    report: Option<ReportFormat>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, ValueEnum)]
enum ReportFormat {
    Table,
    Json,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::discover(cli.config.as_deref(), Path::new("."))?
        .with_overrides(cli.input.clone(), cli.output.clone());

    if cli.verbose {
        println!("{} {}", "Input:".dimmed(), config.input.display().to_string().yellow());
        println!("{} {}", "Output:".dimmed(), config.output.display().to_string().yellow());
    }

    let report = convert_file(&config.input, &config.output)?;

    match &cli.report {
        Some(ReportFormat::Json) => {
            let json = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
            println!("{}", json);
        }
        Some(ReportFormat::Table) => print_table(&report),
        None => {}
    }

    if cli.verbose {
        println!(
            "{} guarded, {} left as-is",
            report.rewritten().to_string().green(),
            report.unchanged().to_string().yellow()
        );
    }

    println!("{} Created {}", "✓".green(), config.output.display().to_string().cyan());
    Ok(())
}

fn print_table(report: &Report) {
    if report.is_empty() {
        println!("{}", "(no DDL statements recognized)".dimmed());
        return;
    }

    println!(
        "{:>6}  {:16} {:32} {}",
        "Line".white().bold(),
        "Statement".white().bold(),
        "Object".white().bold(),
        "Outcome".white().bold()
    );
    println!("{}", "─".repeat(72).dimmed());

    for rewrite in &report.rewrites {
        let outcome = match rewrite.outcome {
            Outcome::Rewritten => rewrite.outcome.to_string().green(),
            Outcome::AlreadyGuarded => rewrite.outcome.to_string().cyan(),
            Outcome::Skipped => rewrite.outcome.to_string().yellow(),
        };
        println!(
            "{:>6}  {:16} {:32} {}",
            rewrite.line,
            rewrite.kind.to_string(),
            rewrite.object.as_deref().unwrap_or("-"),
            outcome
        );
    }
    println!();
}
