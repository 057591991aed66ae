//! Checksum computation for in-memory payloads and files.
//!
//! Downloaded tables are hashed from the bytes already in memory; local
//! files are streamed so large datasets never need to be loaded at once.

use crate::error::{Result, ResultExt as _};
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read as _};
use std::path::Path;

/// Buffer size for streaming file reads (8 KB).
const BUFFER_SIZE: usize = 8192;

/// Supported checksum algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "MD5")]
    Md5,
    #[serde(rename = "SHA-256")]
    Sha256,
}

impl HashAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha256 => "SHA-256",
        }
    }

    /// Length of the lowercase hex digest.
    pub fn hex_len(self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha256 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MD5 of `bytes` as lowercase hex.
pub fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", Md5::digest(bytes))
}

/// SHA-256 of `bytes` as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Hash `bytes` with `algorithm`.
pub fn hash_bytes(bytes: &[u8], algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Md5 => md5_hex(bytes),
        HashAlgorithm::Sha256 => sha256_hex(bytes),
    }
}

/// Hash a file using streaming I/O.
///
/// # Errors
///
/// Returns error if the file can't be opened or read.
pub fn compute_file_hash(path: &Path, algorithm: HashAlgorithm) -> Result<String> {
    match algorithm {
        HashAlgorithm::Md5 => stream_digest::<Md5>(path),
        HashAlgorithm::Sha256 => stream_digest::<Sha256>(path),
    }
}

fn stream_digest<D: Digest>(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file for hashing: {}", path.display()))?;

    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = D::new();
    let mut buffer = [0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn test_known_digests() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex(b"hello world"), "5eb63bbbe01eeed093cb22bb8f5acdc3");
        assert_eq!(
            sha256_hex(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_file_hash_matches_in_memory_hash() {
        let mut temp_file = NamedTempFile::new().unwrap();
        // Larger than the buffer to exercise streaming.
        let data: Vec<u8> = (0..BUFFER_SIZE * 3 + 100).map(|i| (i % 251) as u8).collect();
        temp_file.write_all(&data).unwrap();
        temp_file.flush().unwrap();

        for algorithm in [HashAlgorithm::Md5, HashAlgorithm::Sha256] {
            let from_file = compute_file_hash(temp_file.path(), algorithm).unwrap();
            assert_eq!(from_file, hash_bytes(&data, algorithm));
            assert_eq!(from_file.len(), algorithm.hex_len());
        }
    }

    #[test]
    fn test_compute_file_hash_nonexistent() {
        let result = compute_file_hash(Path::new("/nonexistent/file.csv"), HashAlgorithm::Md5);
        assert!(result.is_err());
    }
}
