//! Content-addressed cache for parsed datasets.
//!
//! Repeated pipeline runs over the same file skip re-reading and re-parsing.
//! The key is the SHA-256 digest of the raw bytes, so a `touch` without a
//! content change still hits, and an edited file misses. Entries live for
//! the lifetime of the process; there is no eviction.

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use eyre::{Result, WrapErr};
use sha2::{Digest, Sha256};

use crate::loader;
use crate::types::TransferRecord;

/// Process-lifetime dataset cache, injected wherever the pipeline runs.
#[derive(Default)]
pub struct DatasetCache {
    entries: DashMap<[u8; 32], Arc<Vec<TransferRecord>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and parse `path`, reusing a previous parse when the bytes match.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is not UTF-8, or fails
    /// to parse as a transfer dataset.
    pub fn load(&self, path: &Path) -> Result<Arc<Vec<TransferRecord>>> {
        let bytes = std::fs::read(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        let digest: [u8; 32] = Sha256::digest(&bytes).into();

        if let Some(hit) = self.entries.get(&digest) {
            tracing::debug!(path = %path.display(), "dataset cache hit");
            return Ok(hit.clone());
        }

        let content = String::from_utf8(bytes)
            .wrap_err_with(|| format!("{} is not valid UTF-8", path.display()))?;
        let records = Arc::new(loader::parse_str(&content)?);
        self.entries.insert(digest, records.clone());

        tracing::debug!(
            path = %path.display(),
            records = records.len(),
            "dataset parsed and cached"
        );
        Ok(records)
    }

    /// Number of distinct datasets cached so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "team_name,counter_team_name,dir,transfer_fee_amnt\nA,B,in,5000000\n";

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file should create");
        file.write_all(content.as_bytes()).expect("write should succeed");
        file
    }

    #[test]
    fn same_bytes_parse_once() {
        let file = write_temp(CSV);
        let cache = DatasetCache::new();

        let first = cache.load(file.path()).expect("load should succeed");
        let second = cache.load(file.path()).expect("load should succeed");

        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn changed_bytes_reparse() {
        let file = write_temp(CSV);
        let cache = DatasetCache::new();

        cache.load(file.path()).expect("load should succeed");
        std::fs::write(
            file.path(),
            format!("{CSV}C,D,left,2000000\n"),
        )
        .expect("rewrite should succeed");
        let reloaded = cache.load(file.path()).expect("load should succeed");

        assert_eq!(cache.len(), 2);
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        let cache = DatasetCache::new();
        assert!(cache.load(Path::new("/nonexistent/transfers.csv")).is_err());
    }
}
