//! Checksum verification.
//!
//! [`verify_bytes`] guards downloaded payloads during ingestion and fails
//! with [`SimError::Integrity`]. [`verify_file`] produces a report for the
//! CLI instead of failing, so a mismatch can be displayed with both hashes.

use super::hasher::{HashAlgorithm, compute_file_hash, hash_bytes};
use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An expected checksum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    pub algorithm: HashAlgorithm,
    pub hex: String,
}

impl Checksum {
    /// # Errors
    ///
    /// [`SimError::Configuration`] if `hex` is not a digest of the right length.
    pub fn new(algorithm: HashAlgorithm, hex: &str) -> Result<Self> {
        let hex = hex.trim().to_lowercase();
        if hex.len() != algorithm.hex_len() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SimError::config(format!(
                "'{hex}' is not a valid {algorithm} checksum"
            )));
        }
        Ok(Self { algorithm, hex })
    }

    pub fn md5(hex: &str) -> Result<Self> {
        Self::new(HashAlgorithm::Md5, hex)
    }

    pub fn sha256(hex: &str) -> Result<Self> {
        Self::new(HashAlgorithm::Sha256, hex)
    }
}

/// Verify `bytes` against `expected`; a missing checksum skips the check.
///
/// # Errors
///
/// [`SimError::Integrity`] when the computed digest differs.
pub fn verify_bytes(bytes: &[u8], expected: Option<&Checksum>) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let actual = hash_bytes(bytes, expected.algorithm);
    if actual == expected.hex {
        tracing::debug!(algorithm = %expected.algorithm, hash = %actual, "Checksum verified");
        Ok(())
    } else {
        Err(SimError::Integrity {
            expected: expected.hex.clone(),
            actual,
        })
    }
}

/// Result of checking a local file against a checksum.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub passed: bool,
    pub message: String,
    pub file_path: String,
    pub algorithm: HashAlgorithm,
    pub expected_hash: String,
    pub actual_hash: Option<String>,
}

impl VerificationResult {
    /// Format for terminal display.
    pub fn format_cli(&self) -> String {
        if self.passed {
            format!(
                "✓ PASS: File integrity verified\n  \
                File: {}\n  \
                Hash: {} ({})",
                self.file_path, self.expected_hash, self.algorithm
            )
        } else {
            let mut output = format!(
                "✗ FAIL: {}\n  \
                File: {}\n  \
                Expected: {}\n  ",
                self.message, self.file_path, self.expected_hash
            );

            if let Some(actual) = &self.actual_hash {
                output.push_str(&format!("Actual:   {actual}\n  "));
            }

            output.push_str("File may have been modified or corrupted");
            output
        }
    }
}

/// Verify a local file against `checksum`.
///
/// Missing or unreadable files produce a failing result rather than an
/// error.
pub fn verify_file(path: &Path, checksum: &Checksum) -> VerificationResult {
    let file_path = path.display().to_string();
    let fail = |message: String, actual_hash: Option<String>| VerificationResult {
        passed: false,
        message,
        file_path: file_path.clone(),
        algorithm: checksum.algorithm,
        expected_hash: checksum.hex.clone(),
        actual_hash,
    };

    if !path.exists() {
        return fail(format!("File not found: {file_path}"), None);
    }

    let actual = match compute_file_hash(path, checksum.algorithm) {
        Ok(hash) => hash,
        Err(e) => return fail(format!("Failed to compute hash: {e}"), None),
    };

    if actual == checksum.hex {
        VerificationResult {
            passed: true,
            message: "File integrity verified successfully".to_owned(),
            file_path: file_path.clone(),
            algorithm: checksum.algorithm,
            expected_hash: checksum.hex.clone(),
            actual_hash: Some(actual),
        }
    } else {
        fail("Hash mismatch detected".to_owned(), Some(actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HELLO_MD5: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3";

    #[test]
    fn test_verify_bytes_pass() {
        let checksum = Checksum::md5(HELLO_MD5).unwrap();
        assert!(verify_bytes(b"hello world", Some(&checksum)).is_ok());
    }

    #[test]
    fn test_verify_bytes_mismatch_is_integrity_error() {
        let checksum = Checksum::md5(HELLO_MD5).unwrap();
        let err = verify_bytes(b"hello world!", Some(&checksum)).unwrap_err();
        match err {
            SimError::Integrity { expected, actual } => {
                assert_eq!(expected, HELLO_MD5);
                assert_ne!(actual, HELLO_MD5);
            }
            other => panic!("expected integrity error, got {other}"),
        }
    }

    #[test]
    fn test_verify_bytes_without_checksum_is_skipped() {
        assert!(verify_bytes(b"anything", None).is_ok());
    }

    #[test]
    fn test_checksum_normalizes_and_validates() {
        let checksum = Checksum::md5(" 5EB63BBBE01EEED093CB22BB8F5ACDC3 ").unwrap();
        assert_eq!(checksum.hex, HELLO_MD5);

        assert!(matches!(
            Checksum::md5("abc"),
            Err(SimError::Configuration(_))
        ));
        assert!(Checksum::sha256(HELLO_MD5).is_err());
    }

    #[test]
    fn test_verify_file_pass_and_fail() {
        let temp_dir = TempDir::new().unwrap();
        let data_file = temp_dir.path().join("table.csv");
        fs::write(&data_file, b"hello world").unwrap();
        let checksum = Checksum::md5(HELLO_MD5).unwrap();

        let result = verify_file(&data_file, &checksum);
        assert!(result.passed);
        assert!(result.format_cli().contains("✓ PASS"));

        fs::write(&data_file, b"tampered").unwrap();
        let result = verify_file(&data_file, &checksum);
        assert!(!result.passed);
        let output = result.format_cli();
        assert!(output.contains("✗ FAIL"));
        assert!(output.contains("Hash mismatch"));
        assert!(output.contains("Actual:"));
    }

    #[test]
    fn test_verify_file_missing() {
        let temp_dir = TempDir::new().unwrap();
        let checksum = Checksum::md5(HELLO_MD5).unwrap();
        let result = verify_file(&temp_dir.path().join("gone.csv"), &checksum);
        assert!(!result.passed);
        assert!(result.message.contains("not found"));
        assert!(result.actual_hash.is_none());
    }
}
