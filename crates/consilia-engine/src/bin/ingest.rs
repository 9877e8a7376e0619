//! consilia-ingest: embed a cleaned dataset and load it into the store.
//!
//! Full-replace semantics: the existing corpus is deleted first, then every
//! record is embedded and persisted in batches. A mid-run failure leaves a
//! partial corpus; re-run after fixing the cause.
//!
//! Usage:
//!   cargo run --bin consilia-ingest -- --input clean.csv

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use consilia_core::defaults;
use consilia_dataset::read_records;
use consilia_db::Database;
use consilia_engine::GuidanceEngine;
use consilia_inference::OpenAIBackend;

#[derive(Parser)]
#[command(name = "consilia-ingest")]
#[command(
    author,
    version,
    about = "Embed a cleaned conversation dataset and load it into the store"
)]
struct Cli {
    /// Cleaned conversations CSV produced by consilia-prepare
    #[arg(short, long)]
    input: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "consilia_engine=info,consilia_db=info,consilia_ingest=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    let records = read_records(&cli.input)?;
    info!(input = %cli.input.display(), records = records.len(), "Loaded cleaned dataset");

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| defaults::DATABASE_URL.to_string());
    let db = Database::connect(&database_url).await?;
    db.migrate().await?;

    let backend = OpenAIBackend::from_env()?;
    let engine = GuidanceEngine::new(Arc::new(db.conversations), Arc::new(backend));

    let report = engine.ingest(records).await?;
    info!(
        stored = report.stored,
        batches = report.batches,
        model = %report.embedding_model,
        dimension = report.embedding_dimension,
        "Ingest complete"
    );

    Ok(())
}
