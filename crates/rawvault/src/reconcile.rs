//! Reconciliation of a scan pass against the manifest.
//!
//! Pure diff, no I/O. A path is reprocessed when the manifest has never
//! seen it or last saw different content; a path the scan no longer finds
//! is reported missing. Only the immediately prior digest is compared: no
//! content history is kept, so a file reverting to an older version still
//! reprocesses.

use rawvault_db::{ManifestEntry, SourceFile};
use std::collections::{HashMap, HashSet};

/// Outcome of diffing one scan against the manifest.
#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Files that are new or whose content changed since the last load
    pub to_process: Vec<SourceFile>,
    /// Manifest paths the scan did not find
    pub missing: Vec<String>,
}

/// Diff the current scan against the full manifest.
///
/// A file present in both with an identical digest is untouched: that is
/// the idempotent fixed point, regardless of its manifest status.
pub fn diff(scanned: &[SourceFile], manifest: &[ManifestEntry]) -> Reconciliation {
    let known: HashMap<&str, &ManifestEntry> = manifest
        .iter()
        .map(|entry| (entry.path.as_str(), entry))
        .collect();

    let mut outcome = Reconciliation::default();

    for file in scanned {
        match known.get(file.path.as_str()) {
            Some(entry) if entry.digest == file.digest => {}
            _ => outcome.to_process.push(file.clone()),
        }
    }

    let seen_paths: HashSet<&str> = scanned.iter().map(|f| f.path.as_str()).collect();
    for entry in manifest {
        if !seen_paths.contains(entry.path.as_str()) {
            outcome.missing.push(entry.path.clone());
        }
    }

    outcome
}
