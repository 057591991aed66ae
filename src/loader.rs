//! Fetching, verifying and parsing remote tables.
//!
//! [`TableLoader`] runs every step against an [`ExecutionContext`]:
//!
//! 1. [`TableLoader::fetch`]: cache lookup, falling back to the context's fetcher
//! 2. [`TableLoader::verify`]: optional checksum, subject to the [`ChecksumPolicy`]
//! 3. [`TableLoader::parse_csv`]: rows of text cells, no type inference
//!
//! Column typing happens later in [`crate::preprocessing`].

pub mod fetch;
pub mod openml;

pub use fetch::{ByteFetcher, DefaultFetcher, FileFetcher, HttpFetcher};
pub use openml::OpenMlDataset;

use crate::context::{ChecksumPolicy, ExecutionContext};
use crate::error::{Result, SimError};
use crate::integrity::{Checksum, verify_bytes};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Clone, Copy, Debug)]
pub struct TableLoader<'a> {
    ctx: &'a ExecutionContext,
}

impl<'a> TableLoader<'a> {
    pub fn new(ctx: &'a ExecutionContext) -> Self {
        Self { ctx }
    }

    /// Bytes behind `source`, from the cache when present.
    pub fn fetch(&self, source: &str) -> Result<Vec<u8>> {
        let cache = self.ctx.cache();
        if let Some(bytes) = cache.get(source)? {
            tracing::debug!(source, bytes = bytes.len(), "Cache hit");
            return Ok(bytes);
        }

        tracing::debug!(source, "Cache miss");
        let bytes = self.ctx.fetcher().fetch(source)?;
        if let Err(err) = cache.put(source, &bytes) {
            tracing::warn!(source, error = %err, "Failed to cache payload");
        }
        Ok(bytes)
    }

    pub fn verify(&self, bytes: &[u8], expected: Option<&Checksum>) -> Result<()> {
        match (self.ctx.checksum_policy(), expected) {
            (ChecksumPolicy::Skip, Some(checksum)) => {
                tracing::warn!(
                    algorithm = %checksum.algorithm,
                    expected = %checksum.hex,
                    "Checksum verification skipped"
                );
                Ok(())
            }
            (_, expected) => verify_bytes(bytes, expected),
        }
    }

    /// Split CSV bytes into rows of cells.
    ///
    /// Rows may have differing lengths here; the transformer reports them.
    pub fn parse_csv(&self, bytes: &[u8]) -> Result<Vec<Vec<String>>> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_owned).collect());
        }
        Ok(rows)
    }

    /// Fetch, verify and parse the CSV at `location`.
    ///
    /// A payload failing verification is evicted from the cache so the next
    /// attempt downloads it again.
    pub fn load_csv(&self, location: &str, checksum: Option<&Checksum>) -> Result<Vec<Vec<String>>> {
        self.ctx.in_scope(|| {
            let bytes = self.fetch(location)?;

            if let Err(err) = self.verify(&bytes, checksum) {
                if matches!(err, SimError::Integrity { .. }) {
                    tracing::warn!(location, "Evicting cached payload after checksum mismatch");
                    self.ctx.cache().remove(location)?;
                }
                return Err(err);
            }

            let rows = self.parse_csv(&bytes)?;
            tracing::info!(location, rows = rows.len(), "Loaded CSV");
            Ok(rows)
        })
    }
}
