//! Integrity verification for fetched tables.
//!
//! Remote CSV payloads can arrive truncated or altered. When a source comes
//! with an expected checksum, the loader hashes the bytes it received and
//! refuses to parse them on mismatch.
//!
//! ```
//! use tabsim::integrity::{Checksum, verify_bytes};
//!
//! let checksum = Checksum::md5("5eb63bbbe01eeed093cb22bb8f5acdc3")?;
//! verify_bytes(b"hello world", Some(&checksum))?;
//! assert!(verify_bytes(b"hello w0rld", Some(&checksum)).is_err());
//! # Ok::<(), tabsim::error::SimError>(())
//! ```
//!
//! ## Edge Cases
//!
//! - **Line endings**: converting CRLF ↔ LF changes the digest
//! - **No checksum**: verification is skipped, not failed
//!
//! ## Architecture
//!
//! - [`hasher`]: MD5/SHA-256 of byte slices and streamed files
//! - [`verifier`]: checksum comparison and CLI reports

pub mod hasher;
pub mod verifier;

pub use hasher::{HashAlgorithm, compute_file_hash, hash_bytes, md5_hex, sha256_hex};
pub use verifier::{Checksum, VerificationResult, verify_bytes, verify_file};
