//! Schema creation for the engine-owned support tables.
//!
//! Only the manifest and the quarantine belong to the engine. The hub is
//! provisioned by the external hub builder, and warehouse target tables are
//! created lazily from the shape of the files being loaded.

use crate::error::Result;
use crate::VaultDb;
use tracing::debug;

impl VaultDb {
    /// Ensure the engine-owned tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA synchronous=NORMAL")
            .execute(&self.pool)
            .await?;

        // File manifest: one row per path ever observed.
        // All timestamps are INTEGER milliseconds since the Unix epoch.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS file_manifest (
                path TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                source_group TEXT NOT NULL,
                digest TEXT NOT NULL,
                file_mtime INTEGER NOT NULL,
                last_seen INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'active'
                    CHECK (status IN ('active', 'missing'))
            )"#,
        )
        .execute(&self.pool)
        .await?;

        // Rejected records: append-only, never updated or deleted.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS rejected_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rejected_at INTEGER NOT NULL,
                rule_name TEXT NOT NULL,
                reason TEXT NOT NULL,
                record_source TEXT NOT NULL,
                payload TEXT NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        debug!("Vault support tables verified");
        Ok(())
    }
}
