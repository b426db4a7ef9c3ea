//! One-pass ingestion engine.
//!
//! The engine assumes the external scheduler enforces at most one run at a
//! time. Within a run, each file is the unit of failure and retry: the
//! manifest upsert for a file happens strictly after its quarantine writes
//! and warehouse append, so a crash or timeout mid-file leaves that file
//! selected for reprocessing on the next run (at-least-once, not
//! exactly-once).

use crate::cancel::CancellationToken;
use crate::config::VaultConfig;
use crate::decode;
use crate::error::{Result, VaultError};
use crate::reconcile;
use crate::rules::{RuleSet, WellMustExist};
use crate::scan::Scanner;
use chrono::Utc;
use rawvault_db::{SourceFile, VaultDb};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// A file the run could not process; everything else proceeded.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: String,
    pub reason: String,
}

/// User-visible summary of one run.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    /// Files the scanner found across all source groups
    pub scanned: usize,
    /// Files processed to completion this run (new or changed)
    pub reprocessed: usize,
    /// Manifest paths no longer present on disk
    pub missing: usize,
    /// Rows routed to quarantine
    pub rejected: u64,
    /// Rows appended to the warehouse
    pub loaded: u64,
    /// Per-file failures; these never abort the run
    pub failures: Vec<FileFailure>,
}

struct FileStats {
    loaded: u64,
    rejected: u64,
}

/// The incremental ingestion & validation engine.
pub struct IngestEngine {
    db: VaultDb,
    config: VaultConfig,
}

impl IngestEngine {
    pub fn new(db: VaultDb, config: VaultConfig) -> Self {
        Self { db, config }
    }

    /// Register new rules here, in evaluation order.
    fn build_rules(hub_wells: HashSet<String>) -> RuleSet {
        RuleSet::new().register(WellMustExist::new(hub_wells))
    }

    /// Execute one ingest pass.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunReport> {
        let scanner = Scanner::new(&self.config);
        let sources = self.config.sources.clone();
        let scan = tokio::task::spawn_blocking(move || scanner.scan(&sources))
            .await
            .map_err(|e| VaultError::InvalidState(format!("Scan task failed: {e}")))??;

        // Reference data comes first: without it validation is meaningless,
        // and nothing may mutate the manifest beforehand.
        let hub_wells = self
            .db
            .hub_well_ids()
            .await
            .map_err(|e| VaultError::HubUnavailable(e.to_string()))?;

        let manifest = self.db.manifest_read_all().await?;
        let reconciliation = reconcile::diff(&scan.files, &manifest);

        let mut report = RunReport {
            scanned: scan.files.len(),
            missing: reconciliation.missing.len(),
            ..Default::default()
        };
        for failure in &scan.failures {
            report.failures.push(FileFailure {
                path: failure.path.clone(),
                reason: failure.message.clone(),
            });
        }

        self.db
            .manifest_mark_missing(&reconciliation.missing, Utc::now())
            .await?;

        let rules = Self::build_rules(hub_wells);
        let op_timeout = Duration::from_secs(self.config.op_timeout_secs);

        for (position, file) in reconciliation.to_process.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    remaining = reconciliation.to_process.len() - position,
                    "Run cancelled; unprocessed files will retry next run"
                );
                break;
            }

            match tokio::time::timeout(op_timeout, self.process_file(file, &rules)).await {
                Err(_) => {
                    warn!(path = %file.path, "File processing timed out; will retry next run");
                    report.failures.push(FileFailure {
                        path: file.path.clone(),
                        reason: format!("timed out after {}s", self.config.op_timeout_secs),
                    });
                }
                Ok(Err(e)) if e.is_fatal_for_run() => return Err(e),
                Ok(Err(e)) => {
                    warn!(path = %file.path, error = %e, "Skipping file");
                    report.failures.push(FileFailure {
                        path: file.path.clone(),
                        reason: e.to_string(),
                    });
                }
                Ok(Ok(stats)) => {
                    report.reprocessed += 1;
                    report.rejected += stats.rejected;
                    report.loaded += stats.loaded;
                }
            }
        }

        info!(
            scanned = report.scanned,
            reprocessed = report.reprocessed,
            missing = report.missing,
            rejected = report.rejected,
            loaded = report.loaded,
            failures = report.failures.len(),
            "Ingest run complete"
        );

        Ok(report)
    }

    /// Process one new or changed file end to end.
    async fn process_file(&self, file: &SourceFile, rules: &RuleSet) -> Result<FileStats> {
        let path = PathBuf::from(&file.path);
        let rows = tokio::task::spawn_blocking(move || decode::read_parquet_rows(&path))
            .await
            .map_err(|e| VaultError::InvalidState(format!("Decode task failed: {e}")))??;

        let row_count = rows.len();
        let outcome = rules.apply_all(rows, &file.name);
        let rejected = outcome.rejected.len() as u64;

        // Quarantine and warehouse must both be durable before the manifest
        // calls this file done. A file with zero accepted rows is still
        // processed, not retried.
        self.db.quarantine_insert(&outcome.rejected).await?;
        let loaded = self
            .db
            .warehouse_append(
                &self.config.target_table,
                &outcome.accepted,
                Utc::now(),
                &file.name,
            )
            .await?;
        self.db.manifest_upsert_active(file, Utc::now()).await?;

        info!(
            path = %file.path,
            group = %file.source_group,
            rows = row_count,
            loaded,
            rejected,
            "File loaded"
        );

        Ok(FileStats { loaded, rejected })
    }
}
