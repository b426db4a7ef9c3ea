//! Incremental ingestion & validation engine for the raw vault.
//!
//! One run is one pass over the configured source directories:
//!
//! - Scan: list Parquet files per source group and fingerprint their content
//! - Reconcile: diff the scan against the manifest into new/changed vs gone
//! - Validate: fold each changed file's rows through the ordered rule set
//! - Quarantine rejects, append accepted rows to the warehouse, then mark
//!   the file active in the manifest
//!
//! Repeated runs over an unchanged directory are no-ops. The manifest is the
//! only durable engine state; everything else is derived from file content.

pub mod cancel;
pub mod cli;
pub mod config;
pub mod decode;
pub mod engine;
mod error;
pub mod fingerprint;
pub mod reconcile;
pub mod rules;
pub mod scan;

pub use cancel::CancellationToken;
pub use config::{SourceDir, VaultConfig};
pub use engine::{FileFailure, IngestEngine, RunReport};
pub use error::{Result, VaultError};
