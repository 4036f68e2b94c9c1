//! LoanLens: loan acceptance risk report
//!
//! Entry point that loads the dataset, runs the analysis stages and prints
//! the report to stdout. Logs go to stderr.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use loanlens::{build_report, load_dataset, Args, RuleThresholds};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_logging(&args);

    let start_time = Instant::now();

    let dataset = load_dataset(&args.input, &args.fallback, &args.sheet)?;
    info!(
        customers = dataset.len(),
        attributes = dataset.attributes().len(),
        "Dataset loaded"
    );
    debug!(elapsed = ?start_time.elapsed(), "Load finished");

    let thresholds = RuleThresholds::default();
    let report = build_report(&dataset, &thresholds, args.top, args.report_date())
        .context("Failed to analyse dataset")?;
    debug!(elapsed = ?start_time.elapsed(), "Analysis finished");

    print!("{}", report);

    Ok(())
}

fn init_logging(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
