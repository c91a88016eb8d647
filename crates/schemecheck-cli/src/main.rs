use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schemecheck_catalog::{FetchError, PostgresProvider, SchemaProvider, TableFilter};
use schemecheck_core::{
    CompareReport, Config, ConnectionConfig, Discrepancy, DiscrepancyKind, ReportSummary,
    NO_DISCREPANCIES,
};
use schemecheck_engine::{CompareOutcome, FetchOptions, SchemaSource};

const DEFAULT_CONFIG: &str = "schemecheck.toml";

/// Schemecheck - compare database schemas and snapshot them
#[derive(Parser)]
#[command(name = "schemecheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: schemecheck.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a live database schema into a snapshot file
    Export {
        #[command(flatten)]
        target: TargetArgs,

        /// Comma-separated table allow-list
        #[arg(long)]
        tables: Option<String>,

        /// Snapshot file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Replace the snapshot file if it already exists
        #[arg(long)]
        force: bool,
    },

    /// Compare a source (live or snapshot) against a live target
    Compare {
        /// Source connection string
        #[arg(long, conflicts_with = "snapshot")]
        source: Option<String>,

        /// Snapshot file to use as the source
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Source database name (derived from the connection when omitted)
        #[arg(long)]
        source_database: Option<String>,

        /// Target connection string
        #[arg(long)]
        target: Option<String>,

        /// Target database name (derived from the connection when omitted)
        #[arg(long)]
        target_database: Option<String>,

        /// Use TLS for live connections
        #[arg(long)]
        tls: bool,

        /// Comma-separated table allow-list
        #[arg(long)]
        tables: Option<String>,

        /// Also write a JSON report
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Check that a database is reachable
    Ping {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Target connection string
    #[arg(long)]
    target: Option<String>,

    /// Database name (derived from the connection when omitted)
    #[arg(long)]
    database: Option<String>,

    /// Use TLS
    #[arg(long)]
    tls: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load .env before reading connection overrides
    dotenvy::dotenv().ok();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(2);
        }
    }
}

/// Logs go to stderr so stdout only carries results
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Run a command; `Ok(false)` means discrepancies were found
async fn run(cli: Cli) -> Result<bool> {
    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Export { target, tables, output, force } => {
            let connection = resolve_connection(target.target, target.database, target.tls, config.target.as_ref(), "target")?;
            let options = fetch_options(&config, tables.as_deref());
            export_command(&connection, &options, &output, force, cli.verbose).await?;
            Ok(true)
        }
        Commands::Compare {
            source,
            snapshot,
            source_database,
            target,
            target_database,
            tls,
            tables,
            report,
        } => {
            let expected = match snapshot {
                Some(path) => SchemaSource::snapshot(path),
                None => {
                    let connection = resolve_connection(source, source_database, tls, config.source.as_ref(), "source")?;
                    SchemaSource::live(&connection)?
                }
            };
            let connection = resolve_connection(target, target_database, tls, config.target.as_ref(), "target")?;
            let actual = SchemaSource::live(&connection)?;
            let options = fetch_options(&config, tables.as_deref());

            compare_command(&expected, &actual, &options, report.as_deref(), cli.verbose).await
        }
        Commands::Ping { target } => {
            let connection = resolve_connection(target.target, target.database, target.tls, config.target.as_ref(), "target")?;
            ping_command(&connection).await?;
            Ok(true)
        }
    }
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    let mut config = if let Some(config_path) = path {
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?
    } else if Path::new(DEFAULT_CONFIG).exists() {
        Config::from_file(Path::new(DEFAULT_CONFIG))?
    } else {
        if verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };

    config.apply_env();
    tracing::debug!(tables = config.tables.len(), policy = ?config.fetch_policy, "config loaded");

    Ok(config)
}

/// Command-line values win over the config file and environment
fn resolve_connection(
    connection: Option<String>,
    database: Option<String>,
    tls: bool,
    fallback: Option<&ConnectionConfig>,
    side: &str,
) -> Result<ConnectionConfig> {
    let mut resolved = match (connection, fallback) {
        (Some(connection), _) => ConnectionConfig::new(connection),
        (None, Some(fallback)) => fallback.clone(),
        (None, None) => {
            return Err(anyhow::anyhow!(
                "No {side} connection given. Pass --{side} or set it in {DEFAULT_CONFIG}"
            ))
        }
    };

    if database.is_some() {
        resolved.database = database;
    }
    resolved.tls |= tls;

    Ok(resolved)
}

fn fetch_options(config: &Config, tables: Option<&str>) -> FetchOptions {
    let filter = match tables {
        Some(list) => TableFilter::parse(list),
        None => TableFilter::from_names(config.tables.iter()),
    };

    FetchOptions {
        filter,
        policy: config.fetch_policy,
    }
}

/// Provider for live connections
fn open_provider(connection: &str, tls: bool) -> Result<Box<dyn SchemaProvider>, FetchError> {
    Ok(Box::new(PostgresProvider::new(connection)?.with_tls(tls)))
}

/// Export command - write a snapshot of a live database
async fn export_command(
    connection: &ConnectionConfig,
    options: &FetchOptions,
    output: &Path,
    force: bool,
    verbose: bool,
) -> Result<()> {
    let source = SchemaSource::live(connection)?;

    if verbose {
        eprintln!("{} {}...", "Exporting".cyan(), source);
    }

    let schema = schemecheck_engine::export_snapshot(&open_provider, &source, options, output, force)
        .await
        .with_context(|| format!("Failed to export {}", source))?;

    println!(
        "{} {} tables, {} columns to {}",
        "✓ Exported".green(),
        schema.len(),
        schema.column_count(),
        output.display()
    );

    Ok(())
}

/// Compare command - report discrepancies between two schemas
async fn compare_command(
    expected: &SchemaSource,
    actual: &SchemaSource,
    options: &FetchOptions,
    report_path: Option<&Path>,
    verbose: bool,
) -> Result<bool> {
    if verbose {
        eprintln!("{} {} against {}...", "Comparing".cyan(), expected, actual);
    }

    let CompareOutcome { expected: expected_schema, actual: actual_schema, comparison } =
        schemecheck_engine::compare_sources(&open_provider, expected, actual, options)
            .await
            .context("Comparison failed")?;

    let report = CompareReport::from_discrepancies(
        expected.to_string(),
        actual.to_string(),
        expected_schema.len(),
        actual_schema.len(),
        comparison.into_discrepancies(),
    );

    if let Some(path) = report_path {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;

        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    print_compare_summary(&report);

    Ok(report.is_clean())
}

/// Ping command - check that a source is reachable
async fn ping_command(connection: &ConnectionConfig) -> Result<()> {
    let source = SchemaSource::live(connection)?;

    schemecheck_engine::test_connection(&open_provider, &source)
        .await
        .with_context(|| format!("Failed to connect to {}", source))?;

    println!("{} {}", "✓ Connected to".green(), source);
    Ok(())
}

/// Print compare results to stdout
fn print_compare_summary(report: &CompareReport) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Schema Comparison Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Expected: {} ({} tables)", report.expected_source, report.summary.expected_tables);
    println!("Actual:   {} ({} tables)", report.actual_source, report.summary.actual_tables);
    println!();

    if report.is_clean() {
        println!("{}", NO_DISCREPANCIES.green().bold());
    } else {
        println!("{}", "Discrepancies:".bold());
        for d in &report.discrepancies {
            print_discrepancy(d);
        }
        println!();
        println!("{}", "Summary:".bold());
        for (kind, count) in kind_counts(&report.summary) {
            println!("  {:<28} {}", kind.as_str(), count);
        }
        println!("  {:<28} {}", "TOTAL", format!("{}", report.summary.total).red().bold());
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

/// Kinds that occurred, in report order
fn kind_counts(summary: &ReportSummary) -> Vec<(DiscrepancyKind, usize)> {
    DiscrepancyKind::ALL
        .into_iter()
        .map(|kind| (kind, summary.count(kind)))
        .filter(|(_, count)| *count > 0)
        .collect()
}

fn print_discrepancy(d: &Discrepancy) {
    println!("  {}", d.to_line());

    if let (Some(exp), Some(act)) = (&d.expected, &d.actual) {
        println!("    Expected: {}", exp);
        println!("    Actual:   {}", act.yellow());
    }
}
