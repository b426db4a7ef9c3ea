//! Reference hub reads.
//!
//! The well hub is maintained by an external builder; the engine only reads
//! it. If the hub has not been provisioned, the read fails and the caller
//! must treat the run as unable to validate.

use crate::error::Result;
use crate::VaultDb;
use sqlx::Row as _;
use std::collections::HashSet;

impl VaultDb {
    /// Current set of valid well identifiers, trimmed, blanks dropped.
    ///
    /// Errors if the hub table does not exist yet.
    pub async fn hub_well_ids(&self) -> Result<HashSet<String>> {
        let rows = sqlx::query("SELECT well_id FROM hub_well")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let id: Option<String> = row.get("well_id");
                id.map(|s| s.trim().to_string())
            })
            .filter(|s| !s.is_empty())
            .collect())
    }

    /// Provision the hub table and insert well identifiers.
    ///
    /// This is the surface used by the external hub builder (and the test
    /// suite); the ingestion engine itself never writes here.
    pub async fn hub_insert_wells(&self, well_ids: &[&str]) -> Result<u64> {
        sqlx::query("CREATE TABLE IF NOT EXISTS hub_well (well_id TEXT PRIMARY KEY)")
            .execute(&self.pool)
            .await?;

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;
        for id in well_ids {
            let result = sqlx::query("INSERT OR IGNORE INTO hub_well (well_id) VALUES (?)")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }
}
