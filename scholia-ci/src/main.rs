//! scholia-ci (Corpus Ingester) - Main entry point
//!
//! One-shot importer that loads a tokenized document into the shared
//! database as string and token rows for one text.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scholia_ci::pipeline;
use scholia_ci::reader::RecordReader;
use scholia_common::config::Config;
use scholia_common::db::init_database;
use scholia_common::db::models::load_user;

/// Command-line arguments for scholia-ci
#[derive(Parser, Debug)]
#[command(name = "scholia-ci")]
#[command(about = "Corpus ingester for Scholia")]
#[command(version)]
struct Args {
    /// Tokenized document to ingest (JSON Lines, one token per line)
    input: PathBuf,

    /// Text the string rows attach to
    #[arg(short, long)]
    text_id: i64,

    /// Language for token deduplication (defaults to the text's language)
    #[arg(short, long)]
    lang: Option<String>,

    /// Delete the text's existing string rows before ingesting
    #[arg(short, long)]
    replace: bool,

    /// User id the ingest runs as
    #[arg(short, long, default_value = "1", env = "SCHOLIA_ACTOR")]
    actor: i64,

    /// Data directory holding the shared database
    #[arg(short, long, env = "SCHOLIA_DATA")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Resolve configuration before tracing so the config file's filter
    // can serve as the fallback when RUST_LOG is unset
    let config = Config::resolve(args.data_dir.as_deref())?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Scholia Corpus Ingester (scholia-ci) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    config.ensure_data_dir()?;
    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to open database")?;

    let Some(actor) = load_user(&pool, args.actor).await? else {
        bail!("unknown actor: {}", args.actor);
    };

    if args.replace {
        let deleted = pipeline::clear_strings(&pool, &actor, args.text_id).await?;
        info!(
            "Replace mode: removed {} prior string rows from text {}",
            deleted, args.text_id
        );
    }

    let records = RecordReader::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let receipt = pipeline::ingest(
        &pool,
        &actor,
        args.text_id,
        args.lang.as_deref(),
        records,
    )
    .await?;

    info!(
        "Ingest {} complete: {} strings, {} new tokens, {:.2}s ({:.0} rows/s)",
        receipt.run_id,
        receipt.strings,
        receipt.new_tokens,
        receipt.elapsed.as_secs_f64(),
        receipt.rows_per_sec()
    );
    Ok(())
}
