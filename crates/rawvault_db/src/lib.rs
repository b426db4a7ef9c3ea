//! Unified database layer for the raw vault.
//!
//! This crate is the single source of truth for all durable ingestion state:
//! - File manifest: last-known state of every source file ever seen
//! - Rejected records: append-only quarantine with full row payloads
//! - Reference hub: valid business keys, maintained by an external builder
//! - Warehouse target tables: append-only, schema driven by the source files
//!
//! All access goes through [`VaultDb`]; raw pool access is an escape hatch.

mod error;
mod schema;
mod types;

// Method implementations organized by domain
mod hub;
mod manifest;
mod quarantine;
mod warehouse;

pub use error::{DbError, Result};
pub use types::*;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

/// Handle to the vault database.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Clone)]
pub struct VaultDb {
    pool: SqlitePool,
}

impl VaultDb {
    /// Open or create a database at the given path.
    ///
    /// Creates the manifest and quarantine tables if they don't exist.
    /// Hub and warehouse tables are owned by their writers and are not
    /// provisioned here.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;

        info!(path = %path.display(), "Vault database opened");

        Ok(db)
    }

    /// Open an in-memory database. Used by tests and dry runs.
    ///
    /// The pool is pinned to a single connection: every connection to
    /// `sqlite::memory:` would otherwise see its own private database.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.ensure_schema().await?;

        Ok(db)
    }

    /// Get the underlying connection pool (escape hatch for ad-hoc queries).
    ///
    /// Prefer the typed methods.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

// Timestamp conventions: all timestamps are stored as INTEGER milliseconds
// since the Unix epoch.
impl VaultDb {
    /// Current time as milliseconds since Unix epoch.
    pub fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Convert stored milliseconds back to a UTC datetime.
    pub fn millis_to_datetime(millis: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_in_memory_creates_schema() {
        let db = VaultDb::open_in_memory().await.unwrap();
        let entries = db.manifest_read_all().await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("vault.sqlite3");
        let db = VaultDb::open(&path).await.unwrap();
        assert!(path.exists());
        db.close().await;
    }

    #[test]
    fn millis_round_trip() {
        let now = VaultDb::now_millis();
        assert_eq!(VaultDb::millis_to_datetime(now).timestamp_millis(), now);
    }
}
