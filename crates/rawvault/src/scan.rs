//! Source directory scanner.
//!
//! Lists candidate files per (group, directory) pair and fingerprints their
//! content on a bounded pool of worker threads. Directories that do not
//! exist yet are skipped silently: upstream collaborators may simply not
//! have produced anything so far. The scanner never writes.

use crate::config::{SourceDir, VaultConfig};
use crate::error::Result;
use crate::fingerprint::fingerprint_file;
use chrono::{DateTime, Utc};
use rawvault_db::SourceFile;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use tracing::{debug, info};
use walkdir::WalkDir;

/// A file the scanner found but could not read or hash.
#[derive(Debug, Clone)]
pub struct ScanFailure {
    pub path: String,
    pub message: String,
}

/// Result of one scan pass.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Candidate files in deterministic order (config order, then path)
    pub files: Vec<SourceFile>,
    /// Per-file read failures; these never abort the scan
    pub failures: Vec<ScanFailure>,
}

/// Directory scanner with content fingerprinting.
pub struct Scanner {
    extension: String,
    hash_workers: usize,
}

impl Scanner {
    pub fn new(config: &VaultConfig) -> Self {
        Self {
            extension: config.file_extension.trim_start_matches('.').to_string(),
            hash_workers: config.hash_workers.max(1),
        }
    }

    /// Scan all source directories.
    pub fn scan(&self, sources: &[SourceDir]) -> Result<ScanOutcome> {
        let mut candidates: Vec<(String, PathBuf)> = Vec::new();
        let mut failures: Vec<ScanFailure> = Vec::new();

        for source in sources {
            let dir = Path::new(&source.path);
            if !dir.is_dir() {
                debug!(group = %source.group, path = %source.path, "Source directory absent, skipping");
                continue;
            }

            for entry in WalkDir::new(dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
            {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        failures.push(ScanFailure {
                            path: e
                                .path()
                                .map(|p| p.display().to_string())
                                .unwrap_or_else(|| source.path.clone()),
                            message: e.to_string(),
                        });
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let matches_extension = entry
                    .path()
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension));
                if matches_extension {
                    candidates.push((source.group.clone(), entry.into_path()));
                }
            }
        }

        let (files, hash_failures) = self.fingerprint_candidates(&candidates);
        failures.extend(hash_failures);

        info!(
            files = files.len(),
            failures = failures.len(),
            "Scan complete"
        );

        Ok(ScanOutcome { files, failures })
    }

    /// Hash candidates on a bounded worker pool, keeping candidate order.
    fn fingerprint_candidates(
        &self,
        candidates: &[(String, PathBuf)],
    ) -> (Vec<SourceFile>, Vec<ScanFailure>) {
        if candidates.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let worker_count = self.hash_workers.min(candidates.len());
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel();

        std::thread::scope(|scope| {
            for _ in 0..worker_count {
                let tx = tx.clone();
                let next = &next;
                scope.spawn(move || loop {
                    let idx = next.fetch_add(1, Ordering::Relaxed);
                    if idx >= candidates.len() {
                        break;
                    }
                    let (group, path) = &candidates[idx];
                    if tx.send((idx, hash_one(group, path))).is_err() {
                        break;
                    }
                });
            }
        });
        drop(tx);

        let mut slots: Vec<Option<std::result::Result<SourceFile, ScanFailure>>> =
            candidates.iter().map(|_| None).collect();
        for (idx, outcome) in rx {
            slots[idx] = Some(outcome);
        }

        let mut files = Vec::new();
        let mut failures = Vec::new();
        for slot in slots.into_iter().flatten() {
            match slot {
                Ok(file) => files.push(file),
                Err(failure) => failures.push(failure),
            }
        }
        (files, failures)
    }
}

fn hash_one(group: &str, path: &Path) -> std::result::Result<SourceFile, ScanFailure> {
    let build = || -> Result<SourceFile> {
        let metadata = path.metadata()?;
        let mtime: DateTime<Utc> = metadata.modified()?.into();
        let digest = fingerprint_file(path)?;
        Ok(SourceFile {
            path: path.display().to_string(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            source_group: group.to_string(),
            digest,
            mtime,
        })
    };

    build().map_err(|e| ScanFailure {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
