//! `rawvault run` command - execute one ingest pass.

use crate::cancel::CancellationToken;
use crate::engine::{IngestEngine, RunReport};
use anyhow::Context;
use clap::Args;
use rawvault_db::VaultDb;
use std::path::Path;
use tracing::warn;

/// Arguments for the `run` command
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Output the run report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the run command
pub async fn cmd_run(config_path: &Path, args: RunArgs) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let db = VaultDb::open(&config.database_path).await?;

    // Ctrl-C cancels at file granularity: the current file finishes or is
    // abandoned uncommitted, nothing else starts.
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current file");
            interrupt.cancel();
        }
    });

    let engine = IngestEngine::new(db, config);
    let report = engine.run(&cancel).await.context("Ingest run failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("Run complete");
    println!("  scanned:     {}", report.scanned);
    println!("  reprocessed: {}", report.reprocessed);
    println!("  missing:     {}", report.missing);
    println!("  loaded:      {}", report.loaded);
    println!("  rejected:    {}", report.rejected);
    if !report.failures.is_empty() {
        println!("  failures:");
        for failure in &report.failures {
            println!("    {}: {}", failure.path, failure.reason);
        }
    }
}
