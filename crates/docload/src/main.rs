//! Docload - bulk JSON document loader

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::error;

use docload::config::LoaderConfig;
use docload::ingest::{BatchStatus, ResetOutcome};
use docload::loader::{self, LoadOptions, RunReport};
use docload::progress;
use docload::store::mongo::MongoStore;
use docload::types::CollectionTarget;
use docload::{decode, Result};
use docload_common::logging::{init_logging, LogConfig, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "docload")]
#[command(author, version, about = "Bulk loader for rate-limited document stores")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load line-delimited JSON datasets into the document store
    Load {
        /// Collection targets: 'name' resolves to <data-dir>/name.json,
        /// 'name=path' names the source file explicitly
        #[arg(required = true)]
        targets: Vec<String>,

        /// Directory containing <name>.json source files
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Connection string
        #[arg(long, env = "DOCLOAD_URI", hide_env_values = true)]
        uri: Option<String>,

        /// Database name (defaults to the connection string's database)
        #[arg(short = 'D', long, env = "DOCLOAD_DATABASE")]
        database: Option<String>,

        /// Documents per insert batch
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Base throttling backoff delay in seconds
        #[arg(long)]
        base_delay: Option<u64>,

        /// Maximum throttling retries per batch (unbounded when omitted)
        #[arg(long)]
        max_retries: Option<u32>,

        /// Reuse existing *_array.json artifacts instead of re-decoding
        #[arg(long)]
        reuse_artifacts: bool,
    },

    /// Convert line-delimited JSON files to array artifacts without loading
    Convert {
        /// Files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Verify connectivity to the document store
    Ping {
        /// Connection string
        #[arg(long, env = "DOCLOAD_URI", hide_env_values = true)]
        uri: Option<String>,

        /// Database name (defaults to the connection string's database)
        #[arg(short = 'D', long, env = "DOCLOAD_DATABASE")]
        database: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Pick up COSMOS_URI and friends from a local .env, if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging; environment variables take precedence, the verbose
    // flag raises the level when the environment does not pin one
    let mut log_config = LogConfig::from_env().unwrap_or_else(|_| {
        LogConfig::builder()
            .log_file_prefix("docload".to_string())
            .build()
    });
    if cli.verbose && std::env::var("DOCLOAD_LOG_LEVEL").is_err() {
        log_config.level = LogLevel::Debug;
    }
    let _ = init_logging(&log_config);

    let result = execute_command(&cli).await;

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Load {
            targets,
            data_dir,
            uri,
            database,
            batch_size,
            base_delay,
            max_retries,
            reuse_artifacts,
        } => {
            cmd_load(
                targets,
                data_dir,
                uri.as_deref(),
                database.as_deref(),
                *batch_size,
                *base_delay,
                *max_retries,
                *reuse_artifacts,
            )
            .await
        },

        Command::Convert { files } => cmd_convert(files),

        Command::Ping { uri, database } => cmd_ping(uri.as_deref(), database.as_deref()).await,
    }
}

/// Assemble the loader config from the environment and CLI overrides
fn resolve_config(uri: Option<&str>, database: Option<&str>) -> Result<LoaderConfig> {
    let mut config = LoaderConfig::from_env()?;

    if let Some(uri) = uri {
        config.set_uri(uri.to_string());
    }
    if let Some(database) = database {
        config.set_database(database.to_string());
    }

    Ok(config)
}

/// Connect with a spinner, failing fast on unreachable servers
async fn connect(config: &LoaderConfig) -> Result<MongoStore> {
    let spinner = progress::create_spinner("Connecting to document store...");
    let connected = MongoStore::connect(config).await;
    spinner.finish_and_clear();

    let store = connected?;
    println!(
        "{} Connected to database '{}'",
        "✓".green(),
        store.database_name()
    );
    Ok(store)
}

#[allow(clippy::too_many_arguments)]
async fn cmd_load(
    specs: &[String],
    data_dir: &Path,
    uri: Option<&str>,
    database: Option<&str>,
    batch_size: Option<usize>,
    base_delay: Option<u64>,
    max_retries: Option<u32>,
    reuse_artifacts: bool,
) -> Result<()> {
    let mut config = resolve_config(uri, database)?;
    if let Some(size) = batch_size {
        config.set_batch_size(size);
    }
    if let Some(delay) = base_delay {
        config.base_delay_secs = delay;
    }
    if let Some(cap) = max_retries {
        config.max_retries = Some(cap);
    }
    config.validate()?;

    let targets = specs
        .iter()
        .map(|spec| CollectionTarget::parse(spec, data_dir, config.batch_size))
        .collect::<Result<Vec<_>>>()?;

    let store = connect(&config).await?;

    let options = LoadOptions {
        policy: config.retry_policy(),
        reuse_artifacts,
    };
    let report = loader::run(&store, &targets, &options).await?;

    print_summary(&report);
    Ok(())
}

fn cmd_convert(files: &[PathBuf]) -> Result<()> {
    for file in files {
        let (records, artifact) = decode::decode_to_artifact(file)?;
        println!(
            "{} {} -> {} ({} records)",
            "✓".green(),
            file.display(),
            artifact.display(),
            records.len()
        );
    }
    Ok(())
}

async fn cmd_ping(uri: Option<&str>, database: Option<&str>) -> Result<()> {
    let config = resolve_config(uri, database)?;
    config.validate()?;

    connect(&config).await?;
    Ok(())
}

/// Print the per-collection rollup and the run's final status line
fn print_summary(report: &RunReport) {
    println!();

    for collection in &report.collections {
        println!(
            "{} {}: {} records, {} batches, {} inserted",
            "✓".green(),
            collection.collection.bold(),
            collection.records,
            collection.batches.len(),
            collection.inserted()
        );

        let duplicates = collection.duplicate_batches();
        if duplicates > 0 {
            println!("  {} {} batch(es) already present, skipped", "→".cyan(), duplicates);
        }

        let retries = collection.total_retries();
        if retries > 0 {
            println!("  {} {} throttling retries performed", "→".cyan(), retries);
        }

        match &collection.reset {
            ResetOutcome::Dropped => {},
            ResetOutcome::Unsupported(message) => {
                println!("  {} collection reset not supported: {}", "⚠".yellow(), message);
            },
            ResetOutcome::Failed(message) => {
                println!("  {} collection reset failed: {}", "⚠".yellow(), message);
            },
        }

        for batch in collection.abandoned_batches() {
            debug_assert_eq!(batch.status, BatchStatus::Abandoned);
            println!(
                "  {} batch {} ({} documents) abandoned: {}",
                "⚠".yellow(),
                batch.index,
                batch.size,
                batch.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if report.is_clean() {
        println!(
            "\n{} All collections loaded ({} documents inserted)",
            "✓".green().bold(),
            report.total_inserted()
        );
    } else {
        println!(
            "\n{} Load finished with {} abandoned batch(es); their documents were not inserted",
            "⚠".yellow().bold(),
            report.abandoned_batches()
        );
    }
}
