//! consilia-prepare: offline transform of raw conversation exports.
//!
//! Reads a raw CSV with `Context` and `Response` columns, runs the cleaning
//! and scoring pipeline, and writes the cleaned CSV plus a statistics report
//! next to it.
//!
//! Usage:
//!   cargo run --bin consilia-prepare -- --input raw.csv --output clean.csv

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::info;

use consilia_dataset::{read_raw_pairs, transform_pairs, write_records, write_stats_report};

#[derive(Parser)]
#[command(name = "consilia-prepare")]
#[command(
    author,
    version,
    about = "Transform raw therapy conversations into a cleaned dataset"
)]
struct Cli {
    /// Raw conversations CSV with Context and Response columns
    #[arg(short, long)]
    input: PathBuf,

    /// Destination for the cleaned CSV; the stats report lands next to it
    #[arg(short, long)]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "consilia_dataset=debug,consilia_prepare=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let pairs = read_raw_pairs(&cli.input)?;
    info!(input = %cli.input.display(), rows = pairs.len(), "Loaded raw conversations");

    let (records, stats) = transform_pairs(pairs);
    write_records(&cli.output, &records)?;

    let stats_path = stats_report_path(&cli.output);
    write_stats_report(&stats_path, &stats)?;

    info!(
        kept = stats.final_count,
        removed = stats.removed_count,
        output = %cli.output.display(),
        report = %stats_path.display(),
        "Wrote cleaned dataset"
    );

    Ok(())
}

/// `clean.csv` gets its report at `clean_stats.txt` in the same directory.
fn stats_report_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    output.with_file_name(format!("{stem}_stats.txt"))
}
