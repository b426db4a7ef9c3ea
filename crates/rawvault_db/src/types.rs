//! Core data model shared between the engine and the database layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Source files & manifest
// ============================================================================

/// A candidate file produced by one scan pass. Ephemeral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Absolute path, unique within a run
    pub path: String,
    /// Display name (file name), carried into derived rows as record source
    pub name: String,
    /// Label of the source directory group this file came from
    pub source_group: String,
    /// Lowercase hex content digest of the file bytes
    pub digest: String,
    /// Filesystem modification time
    pub mtime: DateTime<Utc>,
}

/// Last-known state of a path in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Path was present and loaded at its recorded digest
    Active,
    /// Path vanished from the source directory; digest retained
    Missing,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Missing => "missing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "missing" => Some(Self::Missing),
            _ => None,
        }
    }
}

/// One durable manifest row. Created on first successful load of a path,
/// refreshed on every later sighting, never deleted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub name: String,
    pub source_group: String,
    pub digest: String,
    pub file_mtime: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub status: FileStatus,
}

// ============================================================================
// Quarantine
// ============================================================================

/// A row rejected by a validation rule, with its full original payload.
///
/// One record per (row, rule) failure: a row failing several rules yields
/// several records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub rejected_at: DateTime<Utc>,
    pub rule_name: String,
    pub reason: String,
    /// Display name of the originating file
    pub record_source: String,
    /// JSON object preserving every original column
    pub payload: serde_json::Value,
}

// ============================================================================
// Rows & values
// ============================================================================

/// Tagged scalar carried through the pipeline.
///
/// Kept deliberately small: the warehouse is schema-free, so everything a
/// source file can contain must map onto one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// True for nulls and strings that are empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Str(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Normalized text form used for reference-key lookups.
    ///
    /// Returns an empty string for nulls so blank and absent keys behave
    /// identically.
    pub fn lookup_key(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Str(s) => s.trim().to_string(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Bool(v) => v.to_string(),
            Self::Timestamp(v) => v.to_rfc3339(),
        }
    }

    /// JSON representation for quarantine payloads.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Int(v) => serde_json::Value::from(*v),
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Bool(v) => serde_json::Value::Bool(*v),
            Self::Timestamp(v) => serde_json::Value::String(v.to_rfc3339()),
        }
    }

    /// SQLite column affinity for a column first seen with this value.
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Int(_) | Self::Bool(_) => "INTEGER",
            Self::Float(_) => "REAL",
            Self::Null | Self::Str(_) | Self::Timestamp(_) => "TEXT",
        }
    }
}

/// One row as an ordered list of (column name, value) pairs.
///
/// Column order is the order the source file declared them in; columns
/// unknown to any fixed schema carry through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
        }
    }

    /// Append a column. Duplicate names keep the first occurrence.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if self.get(&name).is_none() {
            self.columns.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Append a column only when it is absent. Used for lineage stamping.
    pub fn stamp(&mut self, name: &str, value: Value) {
        if !self.contains(name) {
            self.columns.push((name.to_string(), value));
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.columns.iter()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Serialize to a JSON object with every original column.
    pub fn to_json_object(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.columns.len());
        for (name, value) in &self.columns {
            map.insert(name.clone(), value.to_json());
        }
        serde_json::Value::Object(map)
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.push(name, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_status_round_trip() {
        for status in [FileStatus::Active, FileStatus::Missing] {
            assert_eq!(FileStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(FileStatus::parse("deleted"), None);
    }

    #[test]
    fn blank_values() {
        assert!(Value::Null.is_blank());
        assert!(Value::Str("  ".into()).is_blank());
        assert!(!Value::Str("W1".into()).is_blank());
        assert!(!Value::Int(0).is_blank());
    }

    #[test]
    fn row_preserves_insertion_order() {
        let mut row = Row::new();
        row.push("b", Value::Int(1));
        row.push("a", Value::Str("x".into()));
        let names: Vec<&str> = row.column_names().collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn stamp_does_not_overwrite() {
        let mut row = Row::new();
        row.push("record_source", Value::Str("original.parquet".into()));
        row.stamp("record_source", Value::Str("other.parquet".into()));
        row.stamp("load_dts", Value::Timestamp(Utc::now()));
        assert_eq!(
            row.get("record_source"),
            Some(&Value::Str("original.parquet".into()))
        );
        assert!(row.contains("load_dts"));
    }

    #[test]
    fn json_object_keeps_unknown_columns() {
        let mut row = Row::new();
        row.push("well_id", Value::Str("W9".into()));
        row.push("mystery_column", Value::Float(1.5));
        let obj = row.to_json_object();
        assert_eq!(obj["well_id"], "W9");
        assert_eq!(obj["mystery_column"], 1.5);
    }
}
