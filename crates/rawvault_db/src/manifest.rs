//! Manifest operations.
//!
//! The manifest is the engine's only durable state: one row per path ever
//! observed, exclusively mutated here. The engine reads it in full once per
//! run and upserts per path.

use crate::error::Result;
use crate::types::{FileStatus, ManifestEntry, SourceFile};
use crate::VaultDb;
use chrono::{DateTime, Utc};
use sqlx::Row as _;

impl VaultDb {
    /// Read the entire manifest, ordered by path.
    pub async fn manifest_read_all(&self) -> Result<Vec<ManifestEntry>> {
        let rows = sqlx::query(
            "SELECT path, name, source_group, digest, file_mtime, last_seen, status \
             FROM file_manifest ORDER BY path",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Record a successful load: insert the path or refresh digest, mtime
    /// and last-seen, and force status back to active.
    pub async fn manifest_upsert_active(
        &self,
        file: &SourceFile,
        last_seen: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO file_manifest (path, name, source_group, digest, file_mtime, last_seen, status)
            VALUES (?, ?, ?, ?, ?, ?, 'active')
            ON CONFLICT(path) DO UPDATE SET
                name = excluded.name,
                source_group = excluded.source_group,
                digest = excluded.digest,
                file_mtime = excluded.file_mtime,
                last_seen = excluded.last_seen,
                status = 'active'
            "#,
        )
        .bind(&file.path)
        .bind(&file.name)
        .bind(&file.source_group)
        .bind(&file.digest)
        .bind(file.mtime.timestamp_millis())
        .bind(last_seen.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Mark paths that disappeared from the source directories.
    ///
    /// Only status and last-seen change; the digest stays untouched so a
    /// reappearing file is compared against its last loaded content.
    pub async fn manifest_mark_missing(
        &self,
        paths: &[String],
        last_seen: DateTime<Utc>,
    ) -> Result<u64> {
        if paths.is_empty() {
            return Ok(0);
        }

        let millis = last_seen.timestamp_millis();
        let mut tx = self.pool.begin().await?;
        let mut marked = 0u64;
        for path in paths {
            let result = sqlx::query(
                "UPDATE file_manifest SET status = 'missing', last_seen = ? WHERE path = ?",
            )
            .bind(millis)
            .bind(path)
            .execute(&mut *tx)
            .await?;
            marked += result.rows_affected();
        }
        tx.commit().await?;

        Ok(marked)
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<ManifestEntry> {
    let status_raw: String = row.get("status");
    let status = FileStatus::parse(&status_raw).ok_or_else(|| {
        crate::DbError::invalid_state(format!("Unknown manifest status: {status_raw}"))
    })?;

    Ok(ManifestEntry {
        path: row.get("path"),
        name: row.get("name"),
        source_group: row.get("source_group"),
        digest: row.get("digest"),
        file_mtime: VaultDb::millis_to_datetime(row.get("file_mtime")),
        last_seen: VaultDb::millis_to_datetime(row.get("last_seen")),
        status,
    })
}
