//! Centralized error handling for tabsim.
//!
//! Every ingestion step reports failures through [`SimError`]. The variants
//! mirror the kinds of problems a caller needs to tell apart:
//!
//! ```
//! use tabsim::error::SimError;
//!
//! fn describe(err: &SimError) -> &'static str {
//!     match err {
//!         SimError::Configuration(_) => "fix the column meta or JSON config",
//!         SimError::MalformedTable(_) => "the table itself is broken",
//!         SimError::Encoding(_) => "a value does not fit its encoder",
//!         SimError::Integrity { .. } => "the download is corrupted",
//!         SimError::Io(_) | SimError::Http(_) => "fetching bytes failed",
//!         _ => "other",
//!     }
//! }
//! ```
//!
//! ## Context Extension Trait
//!
//! [`ResultExt`] adds `.context()` to any `Result` whose error converts into
//! [`SimError`]. I/O failures stay [`SimError::Io`] with the message prepended;
//! every other kind becomes [`SimError::Other`]:
//!
//! ```no_run
//! use tabsim::error::ResultExt as _;
//!
//! fn read_table() -> tabsim::error::Result<String> {
//!     std::fs::read_to_string("table.csv").context("Failed to read table")
//! }
//! ```

use std::fmt;

/// Main error type for simulation ingestion.
#[derive(Debug)]
pub enum SimError {
    /// Malformed or contradictory meta/configuration
    Configuration(String),

    /// Empty table, ragged rows or unparseable CSV
    MalformedTable(String),

    /// A value could not be encoded by its resolved encoder
    Encoding(String),

    /// Fetched bytes did not match the expected checksum
    Integrity { expected: String, actual: String },

    /// Local I/O failures (file fetches, disk cache)
    Io(std::io::Error),

    /// HTTP transport failures
    Http(reqwest::Error),

    /// A reward query referenced a key or action that does not exist
    InvalidChoice(String),

    /// Generic error with context
    Other(String),
}

impl SimError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedTable(msg.into())
    }

    pub(crate) fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            Self::MalformedTable(msg) => write!(f, "Malformed table: {msg}"),
            Self::Encoding(msg) => write!(f, "Encoding error: {msg}"),
            Self::Integrity { expected, actual } => write!(
                f,
                "Integrity error: checksum mismatch (expected {expected}, got {actual})"
            ),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Http(e) => write!(f, "HTTP error: {e}"),
            Self::InvalidChoice(msg) => write!(f, "Invalid choice: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<reqwest::Error> for SimError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(format!("JSON error: {err}"))
    }
}

impl From<csv::Error> for SimError {
    fn from(err: csv::Error) -> Self {
        Self::MalformedTable(format!("CSV error: {err}"))
    }
}

impl From<SimError> for String {
    fn from(err: SimError) -> Self {
        err.to_string()
    }
}

/// Result type alias for tabsim operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<SimError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| with_message(e.into(), msg.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| with_message(e.into(), f()))
    }
}

fn with_message(err: SimError, msg: String) -> SimError {
    match err {
        SimError::Io(e) => SimError::Io(std::io::Error::new(e.kind(), format!("{msg}: {e}"))),
        other => SimError::Other(format!("{msg}: {other}")),
    }
}
