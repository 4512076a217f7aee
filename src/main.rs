//! artifact-atlas — collect museum artifact records into SQLite.
//!
//! Fetches paginated object records from the Harvard Art Museums API,
//! normalizes each one into metadata, media, and color rows, and loads
//! them into a local database explored through a fixed catalog of
//! predefined queries.

#![warn(clippy::all)]

mod api;
mod cli;
mod config;
mod ingest;
mod query;
mod store;
mod transform;

use std::io::Write;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::Config;
use query::{QueryGroup, QueryKind};
use store::{ArtifactStore, CellValue, SqliteArtifactStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_cli(&cli)?;

    let filter = match config.log_level {
        cli::LogLevel::Debug => "debug",
        cli::LogLevel::Info => "info",
        cli::LogLevel::Warn => "warn",
        cli::LogLevel::Error => "error",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Command::Collect(args) => run_collect(&config, args).await,
        Command::Query(args) => run_query(&config, args).await,
        Command::Queries => {
            print_catalog();
            Ok(())
        }
        Command::Status(args) => run_status(&config, args).await,
        Command::Delete(args) => run_delete(&config, args).await,
        Command::ResetDb(args) => run_reset_db(&config, args),
    }
}

/// Run the collect command.
async fn run_collect(config: &Config, args: cli::CollectArgs) -> anyhow::Result<()> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("No API key configured"))?;

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteArtifactStore::open(&config.db_path).await?;
    let client = api::ObjectClient::new(config.api_base_url.clone(), api_key);

    let options = ingest::CollectOptions {
        classification: args.classification,
        max_records: args.max_records,
        page_size: args.page_size,
    };
    let stats = ingest::collect(&client, &store, &options).await?;

    println!("Collect complete:");
    println!("  Fetched:  {}", stats.fetched);
    println!("  Loaded:   {}", stats.loaded);
    println!("  Rejected: {}", stats.rejected);
    println!("  Failed:   {}", stats.failed);

    Ok(())
}

/// Run the query command.
async fn run_query(config: &Config, args: cli::QueryArgs) -> anyhow::Result<()> {
    let kind = QueryKind::from_name(&args.name)?;

    if !config.db_path.exists() {
        println!("No database found at {}", config.db_path.display());
        println!("Run `collect` first to create it.");
        return Ok(());
    }

    let store = SqliteArtifactStore::open(&config.db_path).await?;
    let mut result = query::run_query(&store, kind, &args.params).await?;
    if let Some(limit) = args.limit {
        result.rows.truncate(limit);
    }

    print_table(&result.columns, &result.rows);
    println!();
    println!("{} row(s)", result.rows.len());

    Ok(())
}

/// List every catalog query, grouped the way the catalog is organized.
fn print_catalog() {
    for group in [
        QueryGroup::Metadata,
        QueryGroup::Media,
        QueryGroup::Colors,
        QueryGroup::Joins,
    ] {
        println!("{}:", group.label());
        for kind in QueryKind::ALL.iter().filter(|kind| kind.group() == group) {
            let params = kind.params();
            if params.is_empty() {
                println!("  {:<36} {}", kind.name(), kind.description());
            } else {
                let specs: Vec<String> = params
                    .iter()
                    .map(|spec| format!("{}:{}", spec.name, spec.type_label()))
                    .collect();
                println!(
                    "  {:<36} {} (params: {})",
                    kind.name(),
                    kind.description(),
                    specs.join(", ")
                );
            }
        }
        println!();
    }
    println!("Run a query with: artifact-atlas query <name> [-p name=value]...");
}

/// Run the status command.
async fn run_status(config: &Config, args: cli::StatusArgs) -> anyhow::Result<()> {
    if !config.db_path.exists() {
        println!("No database found at {}", config.db_path.display());
        println!("Run `collect` first to create it.");
        return Ok(());
    }

    let store = SqliteArtifactStore::open(&config.db_path).await?;
    let summary = store.summary().await?;

    println!("Database: {}", config.db_path.display());
    println!();
    println!("Rows:");
    println!("  Artifacts: {}", summary.artifacts);
    println!("  Media:     {}", summary.media_rows);
    println!("  Colors:    {}", summary.color_rows);

    if !summary.by_classification.is_empty() {
        println!();
        println!("Artifacts per classification:");
        for (classification, count) in &summary.by_classification {
            println!("  {:<24} {}", classification, count);
        }
    }

    if let Some(started) = &summary.last_run_started {
        println!();
        println!(
            "Last run started:   {}",
            started.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    if let Some(completed) = &summary.last_run_completed {
        println!(
            "Last run completed: {}",
            completed.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    if args.runs {
        let runs = store.recent_load_runs(10).await?;
        println!();
        println!("Recent collect runs:");
        for run in runs {
            let completed = run
                .completed_at
                .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "(incomplete)".to_string());
            println!(
                "  #{} {} started {} completed {} fetched {} loaded {} rejected {} failed {}",
                run.id,
                run.classification,
                run.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
                completed,
                run.stats.fetched,
                run.stats.loaded,
                run.stats.rejected,
                run.stats.failed,
            );
        }
    }

    Ok(())
}

/// Run the delete command.
async fn run_delete(config: &Config, args: cli::DeleteArgs) -> anyhow::Result<()> {
    if !config.db_path.exists() {
        println!("No database found at {}", config.db_path.display());
        return Ok(());
    }

    if !args.yes {
        println!(
            "This will delete every '{}' artifact and its media and color rows.",
            args.classification
        );
        if !confirm()? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let store = SqliteArtifactStore::open(&config.db_path).await?;
    let removed = store.delete_classification(&args.classification).await?;
    println!("Deleted {} artifact(s).", removed);

    Ok(())
}

/// Run the reset-db command.
fn run_reset_db(config: &Config, args: cli::ResetDbArgs) -> anyhow::Result<()> {
    if !config.db_path.exists() {
        println!("No database found at {}", config.db_path.display());
        return Ok(());
    }

    if !args.yes {
        println!("This will delete the database at:");
        println!("  {}", config.db_path.display());
        if !confirm()? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    std::fs::remove_file(&config.db_path)?;
    println!("Database deleted.");

    // Also remove WAL and SHM files if they exist
    let wal_path = config.db_path.with_extension("db-wal");
    let shm_path = config.db_path.with_extension("db-shm");
    let _ = std::fs::remove_file(&wal_path);
    let _ = std::fs::remove_file(&shm_path);

    Ok(())
}

/// Ask for a y/N confirmation on stdin.
fn confirm() -> anyhow::Result<bool> {
    print!("Are you sure? [y/N] ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Print rows as a left-aligned table sized to the widest cell.
fn print_table(columns: &[String], rows: &[Vec<CellValue>]) {
    let rendered: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(CellValue::render).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(String::len).collect();
    for row in &rendered {
        for (i, cell) in row.iter().enumerate() {
            if cell.len() > widths[i] {
                widths[i] = cell.len();
            }
        }
    }

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(name, &width)| format!("{:<width$}", name))
        .collect();
    println!("{}", header.join("  "));

    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    println!("{}", rule.join("  "));

    for row in &rendered {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{:<width$}", cell))
            .collect();
        println!("{}", line.join("  "));
    }
}
