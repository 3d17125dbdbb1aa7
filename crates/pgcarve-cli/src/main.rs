mod logging;
mod redact;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use uuid::Uuid;

use pgcarve_dump::{DumpEngine, DumpError, DumpOptions, FormatKind};
use pgcarve_manifest::{Manifest, ManifestError};
use redact::redact_connection_string;

#[derive(Debug, Error)]
enum CliError {
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("dump error: {0}")]
    Dump(#[from] DumpError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(name = "pgcarve", version, about = "Masked subset dumps of PostgreSQL databases")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a dump of the manifest-selected tables.
    Dump(DumpArgs),
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// Database connection string (flag form).
    #[arg(long, value_name = "CONNECTION_STRING", conflicts_with = "conn_pos")]
    conn: Option<String>,
    /// Database connection string (positional form).
    #[arg(value_name = "CONNECTION_STRING", required_unless_present = "conn")]
    conn_pos: Option<String>,
    /// Manifest file naming the tables to export.
    #[arg(long, short = 'm', default_value = "manifest.yml")]
    manifest: PathBuf,
    /// Output path for the dump file.
    #[arg(long, short = 'o', default_value = "dump.sql")]
    output: PathBuf,
    /// Output format.
    #[arg(long, value_enum, default_value_t = FormatArg::Copy)]
    format: FormatArg,
    /// Optional path for a JSON report of per-table row counts.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    #[value(name = "copy")]
    Copy,
    #[value(name = "insert")]
    Insert,
    #[value(name = "copy_with_mask")]
    CopyWithMask,
}

impl From<FormatArg> for FormatKind {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Copy => FormatKind::Copy,
            FormatArg::Insert => FormatKind::Insert,
            FormatArg::CopyWithMask => FormatKind::CopyWithMask,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Dump(args) => run_dump(args).await,
    }
}

async fn run_dump(args: DumpArgs) -> Result<(), CliError> {
    let DumpArgs {
        conn,
        conn_pos,
        manifest,
        output,
        format,
        report: report_path,
    } = args;

    let conn = match (conn, conn_pos) {
        (Some(value), None) => value,
        (None, Some(value)) => value,
        (Some(_), Some(_)) => {
            return Err(CliError::InvalidConfig(
                "use either --conn or positional connection string".to_string(),
            ));
        }
        (None, None) => {
            return Err(CliError::InvalidConfig(
                "connection string is required".to_string(),
            ));
        }
    };

    let run_id = Uuid::new_v4().to_string();
    let started_at = chrono::Utc::now();
    tracing::info!(
        run_id = %run_id,
        started_at = %started_at.to_rfc3339(),
        conn = %redact_connection_string(&conn),
        "run started"
    );

    // Configuration errors surface before the first connection attempt.
    let manifest = Manifest::from_path(&manifest)?;

    let timer = Instant::now();
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&conn)
        .await?;

    let engine = DumpEngine::new(DumpOptions {
        output,
        format: format.into(),
    });
    let report = engine.run(&pool, &manifest).await?;

    if let Some(path) = report_path {
        let file = std::fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, &report)?;
        tracing::info!(path = %path.display(), "report written");
    }

    let total_rows: u64 = report.tables.iter().map(|table| table.rows).sum();
    tracing::info!(
        run_id = %run_id,
        tables = report.tables.len(),
        rows = total_rows,
        duration_ms = timer.elapsed().as_millis() as u64,
        "run finished"
    );

    Ok(())
}
