//! `rawvault status` command - summarize durable state.

use chrono::{DateTime, Utc};
use clap::Args;
use rawvault_db::{FileStatus, VaultDb};
use serde::Serialize;
use std::path::Path;

/// Arguments for the `status` command
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct StatusSummary {
    manifest_entries: usize,
    active: usize,
    missing: usize,
    last_seen: Option<DateTime<Utc>>,
    quarantined: i64,
    warehouse_rows: i64,
}

/// Execute the status command
pub async fn cmd_status(config_path: &Path, args: StatusArgs) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    if !Path::new(&config.database_path).exists() {
        println!("No vault database at {} yet", config.database_path);
        return Ok(());
    }

    let db = VaultDb::open(&config.database_path).await?;
    let manifest = db.manifest_read_all().await?;

    let summary = StatusSummary {
        manifest_entries: manifest.len(),
        active: manifest
            .iter()
            .filter(|e| e.status == FileStatus::Active)
            .count(),
        missing: manifest
            .iter()
            .filter(|e| e.status == FileStatus::Missing)
            .count(),
        last_seen: manifest.iter().map(|e| e.last_seen).max(),
        quarantined: db.quarantine_count().await?,
        warehouse_rows: db.warehouse_row_count(&config.target_table).await?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Manifest: {} entries ({} active, {} missing)",
            summary.manifest_entries, summary.active, summary.missing);
        match summary.last_seen {
            Some(ts) => println!("Last seen: {}", ts.to_rfc3339()),
            None => println!("Last seen: never"),
        }
        println!("Quarantined rows: {}", summary.quarantined);
        println!(
            "Warehouse rows ({}): {}",
            config.target_table, summary.warehouse_rows
        );
    }
    Ok(())
}
