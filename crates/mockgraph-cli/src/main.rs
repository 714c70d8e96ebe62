mod config;
mod logging;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use mockgraph_domains::{all_domains, domain_by_name};
use mockgraph_generate::{
    Domain, GenerationEngine, GenerationError, GenerationReport, OutputFormat, RecordCount,
};
use thiserror::Error;
use uuid::Uuid;

use config::{Overrides, check_counts, load_options, parse_count};
use logging::init_run_logging;
use run::start_run;

#[derive(Debug, Error)]
enum CliError {
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("invalid config file: {0}")]
    Config(#[from] toml::de::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("unknown domain '{0}'")]
    UnknownDomain(String),
    #[error("count override '{0}' names no table in the selected domains")]
    UnknownTable(String),
}

#[derive(Parser, Debug)]
#[command(name = "mockgraph", version, about = "Correlated mock-data generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one or more domains into a new run directory.
    Generate(GenerateArgs),
    /// List the built-in domains and their tables.
    List,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Domains to generate (all when omitted).
    #[arg(value_name = "DOMAIN")]
    domains: Vec<String>,
    /// Run seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Output directory for runs.
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,
    /// Output format: json or jsonl.
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Override a table's record count (`table=N` or `domain.table=N`).
    #[arg(long = "count", value_name = "TABLE=N", value_parser = parse_count)]
    counts: Vec<(String, usize)>,
    /// Retry ceiling for identifier allocation.
    #[arg(long)]
    max_id_attempts: Option<u32>,
    /// TOML file with generation options.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Stop at the first failed table.
    #[arg(long, default_value_t = false)]
    fail_fast: bool,
}

fn main() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::List => run_list().map(|()| ExitCode::SUCCESS),
    }
}

fn run_generate(args: GenerateArgs) -> Result<ExitCode, CliError> {
    let GenerateArgs {
        domains,
        seed,
        out,
        format,
        counts,
        max_id_attempts,
        config,
        fail_fast,
    } = args;

    let options = load_options(
        config.as_deref(),
        Overrides {
            seed,
            out,
            format,
            max_id_attempts,
            counts,
            fail_fast,
        },
    )?;
    let domains = resolve_domains(&domains)?;
    check_counts(&options, &domains)?;
    let names: Vec<String> = domains.iter().map(|domain| domain.name.clone()).collect();

    let run_id = Uuid::new_v4().to_string();
    let started_at = chrono::Utc::now();
    let run_paths = start_run(&run_id, started_at, &names, &options)?;
    init_run_logging(&run_paths.logs_path)?;

    tracing::info!(run_id = %run_id, run_dir = %run_paths.root.display(), "run started");

    let engine = GenerationEngine::new(options);
    let result = engine.run_in(&run_paths.root, &run_id, &domains)?;
    print_report(&result.report);
    println!("run directory: {}", result.run_dir.display());

    if result.report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn resolve_domains(names: &[String]) -> Result<Vec<Domain>, CliError> {
    if names.is_empty() {
        return Ok(all_domains()?);
    }
    names
        .iter()
        .map(|name| domain_by_name(name)?.ok_or_else(|| CliError::UnknownDomain(name.clone())))
        .collect()
}

fn print_report(report: &GenerationReport) {
    for table in &report.tables {
        let line = format!(
            "{:<12} {:<24} {:<10} {:>6} rows",
            table.domain, table.table, table.status, table.rows_generated
        );
        match &table.error {
            Some(error) => println!("{line}  {error}"),
            None => println!("{line}"),
        }
    }
    if !report.is_success() {
        println!("{} table(s) not generated", report.failed_count());
    }
}

fn run_list() -> Result<(), CliError> {
    for domain in all_domains()? {
        println!("{}: {}", domain.name, domain.description);
        for table in &domain.tables {
            let count = match table.count {
                RecordCount::Fixed(count) => count.to_string(),
                RecordCount::PerParent => "per parent".to_string(),
            };
            match table.parent_table() {
                Some(parent) => println!("  {:<24} {count:>10}  <- {parent}", table.name),
                None => println!("  {:<24} {count:>10}", table.name),
            }
        }
    }
    Ok(())
}
