//! Content fingerprinting for change detection.
//!
//! The digest is a pure function of file bytes: filesystem metadata (mtime,
//! path, permissions) never influences it, so a copied or touched file keeps
//! its fingerprint and only real content changes trigger reprocessing.

use crate::error::Result;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CHUNK_SIZE: usize = 1024 * 1024;

/// Streaming BLAKE3 digest of a file, as 64 lowercase hex characters.
///
/// Reads in bounded chunks; the file is never held in memory whole.
pub fn fingerprint_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};

    #[test]
    fn deterministic_over_content() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.parquet");
        let b = dir.path().join("b.parquet");
        std::fs::write(&a, b"same bytes").unwrap();
        std::fs::write(&b, b"same bytes").unwrap();

        let digest_a = fingerprint_file(&a).unwrap();
        let digest_b = fingerprint_file(&b).unwrap();
        assert_eq!(digest_a, digest_b);
        assert_eq!(digest_a.len(), 64);
        assert!(digest_a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ignores_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.parquet");
        std::fs::write(&path, b"payload").unwrap();

        let before = fingerprint_file(&path).unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(1_000_000, 0)).unwrap();
        let after = fingerprint_file(&path).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn one_byte_change_changes_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.parquet");
        std::fs::write(&path, b"payload-0").unwrap();
        let before = fingerprint_file(&path).unwrap();

        std::fs::write(&path, b"payload-1").unwrap();
        let after = fingerprint_file(&path).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(fingerprint_file(&dir.path().join("gone.parquet")).is_err());
    }
}
