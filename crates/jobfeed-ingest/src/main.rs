//! Jobfeed - job listing ingestion tool

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use jobfeed_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use jobfeed_ingest::config::Config;
use jobfeed_ingest::export::{self, DEFAULT_CSV_PATH};
use jobfeed_ingest::fetch::{self, Fetcher};
use jobfeed_ingest::load::{Loader, MemoryStore, PgStore, TableRef, WriteMode};
use jobfeed_ingest::normalize::Normalizer;
use jobfeed_ingest::pipeline::{DocumentSource, JobPipeline};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "jobfeed")]
#[command(author, version, about = "Job listing ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, normalize and load job listings
    Run(RunArgs),

    /// Normalize a saved response and export it to CSV
    Normalize {
        /// Saved API response
        #[arg(short, long)]
        input: PathBuf,

        /// CSV output file
        #[arg(long, default_value = DEFAULT_CSV_PATH)]
        csv: PathBuf,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Read a saved API response instead of calling the API
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Destination table
    #[arg(long)]
    table: Option<String>,

    /// Destination schema
    #[arg(long)]
    schema: Option<String>,

    /// Write mode (append, replace)
    #[arg(long)]
    mode: Option<WriteMode>,

    /// Rows per insert batch
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Also export the normalized table to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Keep a copy of the raw API response
    #[arg(long)]
    save_raw: Option<PathBuf>,

    /// Load into an in-memory store instead of the database
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .output(LogOutput::Both)
        .log_file_prefix("jobfeed")
        .build()
        .with_env_overrides()?;

    let _guard = init_logging(&log_config)?;

    let outcome = match cli.command {
        Command::Run(args) => run(args).await,
        Command::Normalize { input, csv } => normalize(input, csv).await,
    };

    if let Err(e) = &outcome {
        error!(error = %format!("{:#}", e), "jobfeed failed");
    }
    outcome
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;

    if let Some(table) = args.table {
        config.load.table.name = table;
    }
    if let Some(schema) = args.schema {
        config.load.table.schema = schema;
    }
    if let Some(mode) = args.mode {
        config.load.mode = mode;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.load.chunk_size = chunk_size;
    }
    config.validate().context("Invalid configuration")?;

    let source = match args.input {
        Some(path) => DocumentSource::File(path),
        None => {
            if config.fetch.api_key.is_none() {
                warn!("JOBFEED_API_KEY is not set; the API will likely reject the request");
            }
            DocumentSource::Api(Fetcher::new(config.fetch.clone())?)
        },
    };

    let loader = if args.dry_run {
        info!("Dry run: loading into an in-memory store");
        Loader::new(MemoryStore::new())
    } else {
        let timeout = Duration::from_secs(config.database.connect_timeout_secs);
        Loader::new(PgStore::new(config.database.url.clone()).with_connect_timeout(timeout))
    };
    let loader = loader.with_chunk_size(config.load.chunk_size);

    let destination: TableRef = config.load.table.clone();
    let mut pipeline = JobPipeline::new(source, loader, destination, config.load.mode);
    if let Some(path) = args.csv {
        pipeline = pipeline.with_export(path);
    }
    if let Some(path) = args.save_raw {
        pipeline = pipeline.with_raw_copy(path);
    }

    let report = pipeline.run().await?;

    match &report.load {
        Ok(result) => info!(
            run_id = %report.run_id,
            rows_written = result.rows_written,
            "Ingestion complete"
        ),
        // Already logged by the loader; the run itself still counts as done.
        Err(_) => warn!(run_id = %report.run_id, "Ingestion finished without loading data"),
    }

    Ok(())
}

async fn normalize(input: PathBuf, csv: PathBuf) -> Result<()> {
    let document = fetch::read_document(&input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let table = Normalizer::default().normalize(document)?;
    let rows = export::write_csv(&table, &csv)?;

    info!(rows, columns = table.column_count(), "Normalization complete");
    Ok(())
}
