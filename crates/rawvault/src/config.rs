//! Configuration for the ingestion engine.
//!
//! Built once at startup, validated, and passed into the engine explicitly.

use crate::error::{Result, VaultError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A (group label, directory) pair to scan for Parquet files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDir {
    /// Source group tag recorded in the manifest (e.g. "sgx_parquet")
    pub group: String,
    /// Directory to list; silently skipped while it does not exist
    pub path: String,
}

/// Main configuration for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Path to the vault SQLite database
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Source directories to scan
    #[serde(default)]
    pub sources: Vec<SourceDir>,

    /// Warehouse table receiving accepted rows
    #[serde(default = "default_target_table")]
    pub target_table: String,

    /// File extension to ingest (without the dot)
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Worker threads for content fingerprinting
    #[serde(default = "default_hash_workers")]
    pub hash_workers: usize,

    /// Upper bound on the storage work for one file, in seconds
    #[serde(default = "default_op_timeout_secs")]
    pub op_timeout_secs: u64,
}

fn default_database_path() -> String {
    dirs::home_dir()
        .map(|h| h.join(".rawvault").join("rawvault.sqlite3"))
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "rawvault.sqlite3".to_string())
}

fn default_target_table() -> String {
    "sat_sensor_well_readings".to_string()
}

fn default_file_extension() -> String {
    "parquet".to_string()
}

fn default_hash_workers() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}

fn default_op_timeout_secs() -> u64 {
    30
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            sources: Vec::new(),
            target_table: default_target_table(),
            file_extension: default_file_extension(),
            hash_workers: default_hash_workers(),
            op_timeout_secs: default_op_timeout_secs(),
        }
    }
}

impl VaultConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: VaultConfig =
            toml::from_str(&content).map_err(|e| VaultError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| VaultError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate once at startup; the engine assumes a valid config.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(VaultError::Config(
                "At least one source directory is required".to_string(),
            ));
        }
        for source in &self.sources {
            if source.group.trim().is_empty() {
                return Err(VaultError::Config(format!(
                    "Source directory {:?} has a blank group label",
                    source.path
                )));
            }
        }
        let table_ok = self
            .target_table
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && self
                .target_table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !table_ok {
            return Err(VaultError::Config(format!(
                "Invalid target table name: {:?}",
                self.target_table
            )));
        }
        if self.file_extension.trim().is_empty() {
            return Err(VaultError::Config(
                "File extension must not be blank".to_string(),
            ));
        }
        if self.hash_workers == 0 {
            return Err(VaultError::Config(
                "hash_workers must be at least 1".to_string(),
            ));
        }
        if self.op_timeout_secs == 0 {
            return Err(VaultError::Config(
                "op_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> VaultConfig {
        VaultConfig {
            sources: vec![SourceDir {
                group: "sgx_parquet".to_string(),
                path: "/data/sgx_parquet".to_string(),
            }],
            ..VaultConfig::default()
        }
    }

    #[test]
    fn defaults_are_sane() {
        let config = VaultConfig::default();
        assert_eq!(config.file_extension, "parquet");
        assert_eq!(config.target_table, "sat_sensor_well_readings");
        assert!(config.hash_workers >= 1);
        assert!(config.op_timeout_secs >= 1);
    }

    #[test]
    fn validate_rejects_empty_sources() {
        let config = VaultConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_table_name() {
        let mut config = valid_config();
        config.target_table = "drop table; --".to_string();
        assert!(config.validate().is_err());

        config.target_table = "9starts_with_digit".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_accepts_good_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rawvault.toml");

        let config = valid_config();
        config.save(&path).unwrap();

        let loaded = VaultConfig::load(&path).unwrap();
        assert_eq!(loaded.sources.len(), 1);
        assert_eq!(loaded.sources[0].group, "sgx_parquet");
        assert_eq!(loaded.target_table, config.target_table);
    }
}
