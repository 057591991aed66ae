//! Persistent cache storing one file per source.
//!
//! Keys are URLs or dataset identifiers, so file names are the SHA-256 of
//! the key to stay filesystem-safe.

use super::Cache;
use crate::error::{Result, ResultExt as _};
use crate::integrity::sha256_hex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Extension used for cached payload files.
pub const ENTRY_EXTENSION: &str = "bin";

#[derive(Clone, Debug)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// A cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{ENTRY_EXTENSION}", sha256_hex(key.as_bytes())))
    }
}

impl Cache for DiskCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read cache entry: {}", path.display()))
            }
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create cache directory: {}", self.dir.display())
        })?;

        // Write then rename so readers never observe a partial entry.
        let path = self.entry_path(key);
        let partial = path.with_extension("partial");
        fs::write(&partial, bytes)
            .with_context(|| format!("Failed to write cache entry: {}", partial.display()))?;
        fs::rename(&partial, &path)
            .with_context(|| format!("Failed to finalize cache entry: {}", path.display()))?;
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.entry_path(key).exists()
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.entry_path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn clear(&self) -> Result<()> {
        if !self.dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(&self.dir)
            .context("Failed to read cache directory")?
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some(ENTRY_EXTENSION) {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove cache entry: {}", path.display()))?;
            }
        }
        Ok(())
    }
}
