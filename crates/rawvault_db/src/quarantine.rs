//! Quarantine operations.
//!
//! Rejected rows are appended with their full original payload and never
//! touched again. Purely diagnostic.

use crate::error::Result;
use crate::types::RejectedRecord;
use crate::VaultDb;
use sqlx::Row as _;

impl VaultDb {
    /// Append rejected records in one transaction.
    pub async fn quarantine_insert(&self, records: &[RejectedRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for record in records {
            let payload = serde_json::to_string(&record.payload)?;
            sqlx::query(
                r#"
                INSERT INTO rejected_records (rejected_at, rule_name, reason, record_source, payload)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(record.rejected_at.timestamp_millis())
            .bind(&record.rule_name)
            .bind(&record.reason)
            .bind(&record.record_source)
            .bind(payload)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(records.len() as u64)
    }

    /// Total number of quarantined rows.
    pub async fn quarantine_count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM rejected_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Read quarantined rows in append order, most recent last.
    pub async fn quarantine_list(&self, limit: i64) -> Result<Vec<RejectedRecord>> {
        let rows = sqlx::query(
            "SELECT rejected_at, rule_name, reason, record_source, payload \
             FROM rejected_records ORDER BY id LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let payload_raw: String = row.get("payload");
                let payload = serde_json::from_str(&payload_raw)?;
                Ok(RejectedRecord {
                    rejected_at: VaultDb::millis_to_datetime(row.get("rejected_at")),
                    rule_name: row.get("rule_name"),
                    reason: row.get("reason"),
                    record_source: row.get("record_source"),
                    payload,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Row, Value};
    use chrono::Utc;

    fn sample_reject(rule: &str, source: &str) -> RejectedRecord {
        let mut row = Row::new();
        row.push("well_id", Value::Str("W9".into()));
        row.push("reading", Value::Float(12.5));
        RejectedRecord {
            rejected_at: Utc::now(),
            rule_name: rule.to_string(),
            reason: "well_id not found in well hub".to_string(),
            record_source: source.to_string(),
            payload: row.to_json_object(),
        }
    }

    #[tokio::test]
    async fn insert_and_read_back() {
        let db = VaultDb::open_in_memory().await.unwrap();
        let records = vec![
            sample_reject("well_must_exist", "a.parquet"),
            sample_reject("well_must_exist", "b.parquet"),
        ];

        let inserted = db.quarantine_insert(&records).await.unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(db.quarantine_count().await.unwrap(), 2);

        let stored = db.quarantine_list(10).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].rule_name, "well_must_exist");
        assert_eq!(stored[0].record_source, "a.parquet");
        assert_eq!(stored[0].payload["well_id"], "W9");
        assert_eq!(stored[0].payload["reading"], 12.5);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let db = VaultDb::open_in_memory().await.unwrap();
        assert_eq!(db.quarantine_insert(&[]).await.unwrap(), 0);
        assert_eq!(db.quarantine_count().await.unwrap(), 0);
    }
}
