//! Warehouse loading.
//!
//! Target tables are append-only and file-driven: the column set is the
//! union of every column the source files have carried, plus the lineage
//! columns `load_dts` and `record_source`. Tables are created on first
//! contact and widened when a file introduces columns never seen before.

use crate::error::{DbError, Result};
use crate::types::{Row, Value};
use crate::VaultDb;
use chrono::{DateTime, Utc};
use sqlx::Row as _;
use tracing::debug;

/// Lineage column stamped with the load time when the row lacks it.
pub const LOAD_DTS_COLUMN: &str = "load_dts";
/// Lineage column stamped with the originating file name when absent.
pub const RECORD_SOURCE_COLUMN: &str = "record_source";

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if head_ok && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(DbError::invalid_state(format!(
            "Invalid warehouse table name: {name:?}"
        )))
    }
}

impl VaultDb {
    /// Append one file's accepted rows to the target table.
    ///
    /// Every row is stamped with `load_dts` and `record_source` unless the
    /// source data already carries those columns. The whole batch commits in
    /// one transaction; an empty batch appends nothing.
    pub async fn warehouse_append(
        &self,
        table: &str,
        rows: &[Row],
        load_dts: DateTime<Utc>,
        record_source: &str,
    ) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        validate_table_name(table)?;

        let columns = column_union(rows);
        self.ensure_target_table(table, &columns, rows).await?;

        let column_sql = columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            column_sql,
            placeholders
        );

        let load_dts_text = load_dts.to_rfc3339();
        let mut tx = self.pool.begin().await?;
        for row in rows {
            let mut query = sqlx::query(&sql);
            for column in &columns {
                query = match row.get(column) {
                    Some(value) => bind_value(query, value),
                    None if column == LOAD_DTS_COLUMN => query.bind(load_dts_text.clone()),
                    None if column == RECORD_SOURCE_COLUMN => query.bind(record_source.to_string()),
                    None => query.bind(None::<String>),
                };
            }
            query.execute(&mut *tx).await?;
        }
        tx.commit().await?;

        debug!(table, rows = rows.len(), record_source, "Warehouse append");
        Ok(rows.len() as u64)
    }

    /// Row count for a target table; zero if it was never created.
    pub async fn warehouse_row_count(&self, table: &str) -> Result<i64> {
        validate_table_name(table)?;
        if !self.table_exists(table).await? {
            return Ok(0);
        }
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {}", quote_ident(table)))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        let row = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Create the target table or widen it with columns it has not seen.
    async fn ensure_target_table(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Row],
    ) -> Result<()> {
        if !self.table_exists(table).await? {
            let defs = columns
                .iter()
                .map(|c| format!("{} {}", quote_ident(c), column_affinity(c, rows)))
                .collect::<Vec<_>>()
                .join(", ");
            sqlx::query(&format!(
                "CREATE TABLE IF NOT EXISTS {} ({})",
                quote_ident(table),
                defs
            ))
            .execute(&self.pool)
            .await?;
            return Ok(());
        }

        let existing = self.table_columns(table).await?;
        for column in columns {
            if !existing.iter().any(|c| c == column) {
                sqlx::query(&format!(
                    "ALTER TABLE {} ADD COLUMN {} {}",
                    quote_ident(table),
                    quote_ident(column),
                    column_affinity(column, rows)
                ))
                .execute(&self.pool)
                .await?;
                debug!(table, column = column.as_str(), "Widened target table");
            }
        }
        Ok(())
    }

    async fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(&format!("PRAGMA table_info({})", quote_ident(table)))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("name")).collect())
    }
}

/// Union of row columns in first-seen order, with the lineage columns
/// appended when no source column already claims them.
fn column_union(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for name in row.column_names() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
    }
    for lineage in [LOAD_DTS_COLUMN, RECORD_SOURCE_COLUMN] {
        if !columns.iter().any(|c| c == lineage) {
            columns.push(lineage.to_string());
        }
    }
    columns
}

/// Affinity from the first non-null value observed for the column.
fn column_affinity(column: &str, rows: &[Row]) -> &'static str {
    rows.iter()
        .filter_map(|row| row.get(column))
        .find(|v| !matches!(v, Value::Null))
        .map(Value::sql_type)
        .unwrap_or("TEXT")
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    value: &Value,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Str(s) => query.bind(s.clone()),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::Bool(v) => query.bind(*v),
        Value::Timestamp(v) => query.bind(v.to_rfc3339()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(well: &str, value: f64) -> Row {
        let mut row = Row::new();
        row.push("well_id", Value::Str(well.into()));
        row.push("reading", Value::Float(value));
        row
    }

    #[tokio::test]
    async fn creates_table_and_stamps_lineage() {
        let db = VaultDb::open_in_memory().await.unwrap();
        let rows = vec![reading("W1", 1.0), reading("W2", 2.0)];

        let appended = db
            .warehouse_append("sat_readings", &rows, Utc::now(), "a.parquet")
            .await
            .unwrap();
        assert_eq!(appended, 2);
        assert_eq!(db.warehouse_row_count("sat_readings").await.unwrap(), 2);

        let stored = sqlx::query("SELECT well_id, record_source, load_dts FROM sat_readings")
            .fetch_all(db.pool())
            .await
            .unwrap();
        for row in &stored {
            let source: String = row.get("record_source");
            let load_dts: String = row.get("load_dts");
            assert_eq!(source, "a.parquet");
            assert!(!load_dts.is_empty());
        }
    }

    #[tokio::test]
    async fn widens_table_for_new_columns() {
        let db = VaultDb::open_in_memory().await.unwrap();
        db.warehouse_append("sat_readings", &[reading("W1", 1.0)], Utc::now(), "a.parquet")
            .await
            .unwrap();

        let mut wider = reading("W2", 2.0);
        wider.push("pressure", Value::Int(7));
        db.warehouse_append("sat_readings", &[wider], Utc::now(), "b.parquet")
            .await
            .unwrap();

        let rows = sqlx::query("SELECT pressure FROM sat_readings ORDER BY rowid")
            .fetch_all(db.pool())
            .await
            .unwrap();
        let first: Option<i64> = rows[0].get("pressure");
        let second: Option<i64> = rows[1].get("pressure");
        assert_eq!(first, None);
        assert_eq!(second, Some(7));
    }

    #[tokio::test]
    async fn existing_record_source_is_not_overwritten() {
        let db = VaultDb::open_in_memory().await.unwrap();
        let mut row = reading("W1", 1.0);
        row.push("record_source", Value::Str("upstream.parquet".into()));

        db.warehouse_append("sat_readings", &[row], Utc::now(), "a.parquet")
            .await
            .unwrap();

        let stored = sqlx::query("SELECT record_source FROM sat_readings")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let source: String = stored.get("record_source");
        assert_eq!(source, "upstream.parquet");
    }

    #[tokio::test]
    async fn empty_batch_appends_nothing() {
        let db = VaultDb::open_in_memory().await.unwrap();
        let appended = db
            .warehouse_append("sat_readings", &[], Utc::now(), "a.parquet")
            .await
            .unwrap();
        assert_eq!(appended, 0);
        assert_eq!(db.warehouse_row_count("sat_readings").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejects_malformed_table_names() {
        let db = VaultDb::open_in_memory().await.unwrap();
        let result = db
            .warehouse_append("bad name; --", &[reading("W1", 1.0)], Utc::now(), "a")
            .await;
        assert!(result.is_err());
    }
}
