//! Table transformation.
//!
//! Turns a [`RawTable`] of text cells into encoded context rows plus an
//! encoded label column. Cost is `O(rows × columns)`: each column that needs
//! fitting is scanned exactly once to fit, and once more to encode.

use super::encoders::{Encoded, Encoder, Scalar};
use super::meta::{ColumnKey, ColumnMeta, ColumnOverrides, ResolvedMeta, resolve_columns};
use crate::error::{Result, SimError};
use std::time::Instant;

/// A rectangular table of text cells with an optional header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawTable {
    header: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
    width: usize,
}

impl RawTable {
    /// Build a table from rows, stripping the first row as header when
    /// `has_header` is set.
    ///
    /// # Errors
    ///
    /// [`SimError::MalformedTable`] if there are no data rows, or any row
    /// (header included) differs in width from the first data row.
    pub fn from_rows(mut rows: Vec<Vec<String>>, has_header: bool) -> Result<Self> {
        let header = if has_header && !rows.is_empty() {
            Some(rows.remove(0))
        } else {
            None
        };

        let width = rows
            .first()
            .map(Vec::len)
            .ok_or_else(|| SimError::malformed("table has no data rows"))?;

        if width == 0 {
            return Err(SimError::malformed("table has no columns"));
        }

        if let Some(h) = &header
            && h.len() != width
        {
            return Err(SimError::malformed(format!(
                "header has {} columns but the first row has {width}",
                h.len()
            )));
        }

        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(SimError::malformed(format!(
                "row {i} has {} columns, expected {width}",
                row.len()
            )));
        }

        Ok(Self {
            header,
            rows,
            width,
        })
    }

    /// Build a table from JSON rows. Strings are taken verbatim, other
    /// scalars use their JSON text and `null` becomes an empty cell.
    pub fn from_json_rows(rows: &[Vec<serde_json::Value>], has_header: bool) -> Result<Self> {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(json_cell).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;
        Self::from_rows(rows, has_header)
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_name(&self, index: usize) -> String {
        self.header
            .as_ref()
            .and_then(|h| h.get(index).cloned())
            .unwrap_or_else(|| index.to_string())
    }

    fn column(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map_or("", String::as_str))
    }
}

fn json_cell(value: &serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Null => Ok(String::new()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(SimError::malformed(format!(
            "table cells must be scalars, found {other}"
        ))),
    }
}

/// How a table's columns are interpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableOptions {
    pub has_header: bool,
    pub default_meta: ColumnMeta,
    pub overrides: ColumnOverrides,
    pub label_column: Option<ColumnKey>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            default_meta: ColumnMeta::default(),
            overrides: ColumnOverrides::new(),
            label_column: None,
        }
    }
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn without_header(mut self) -> Self {
        self.has_header = false;
        self
    }

    #[must_use]
    pub fn with_default(mut self, meta: ColumnMeta) -> Self {
        self.default_meta = meta;
        self
    }

    #[must_use]
    pub fn with_override(mut self, column: impl Into<ColumnKey>, meta: ColumnMeta) -> Self {
        self.overrides.insert(column.into(), meta);
        self
    }

    #[must_use]
    pub fn with_label(mut self, column: impl Into<ColumnKey>) -> Self {
        self.label_column = Some(column.into());
        self
    }
}

/// Encoded rows, index-aligned with the input table.
#[derive(Clone, Debug)]
pub struct EncodedTable {
    pub feature_names: Vec<String>,
    pub contexts: Vec<Vec<Scalar>>,
    pub labels: Vec<Encoded>,
    pub label_encoder: Encoder,
}

impl EncodedTable {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Scalars per context row.
    pub fn context_width(&self) -> usize {
        self.contexts.first().map_or(0, Vec::len)
    }
}

struct FeatureColumn {
    index: usize,
    name: String,
    encoder: Encoder,
}

/// Encode `table` according to `options`.
///
/// # Errors
///
/// [`SimError::Configuration`] for invalid column meta and
/// [`SimError::Encoding`] for values the resolved encoder rejects.
pub fn transform(table: &RawTable, options: &TableOptions) -> Result<EncodedTable> {
    let start = Instant::now();
    let metas = resolve_columns(
        table.header(),
        table.width(),
        &options.default_meta,
        &options.overrides,
        options.label_column.as_ref(),
    )?;

    let mut features = Vec::new();
    let mut label = None;
    for (index, meta) in metas.into_iter().enumerate() {
        let ResolvedMeta {
            ignore,
            label: is_label,
            encoder,
        } = meta;
        if is_label {
            label = Some((index, encoder));
        } else if !ignore {
            features.push(FeatureColumn {
                index,
                name: table.column_name(index),
                encoder,
            });
        }
    }
    let (label_index, label_encoder) =
        label.ok_or_else(|| SimError::config("No label column resolved"))?;

    // Fit: one pass per column, only where the encoder needs it.
    for feature in &mut features {
        if !feature.encoder.is_fit() {
            feature.encoder = feature.encoder.fit(table.column(feature.index));
        }
    }
    let label_encoder = if label_encoder.is_fit() {
        label_encoder
    } else {
        label_encoder.fit(table.column(label_index))
    };

    // Encode: column-major into pre-sized row buffers.
    let width: usize = features
        .iter()
        .map(|f| f.encoder.width().unwrap_or(1))
        .sum();
    let mut contexts: Vec<Vec<Scalar>> = (0..table.len())
        .map(|_| Vec::with_capacity(width))
        .collect();

    for feature in &features {
        feature
            .encoder
            .encode_column(table.column(feature.index), &mut contexts)
            .map_err(|e| in_column(&feature.name, e))?;
    }

    let label_name = table.column_name(label_index);
    let labels = table
        .column(label_index)
        .enumerate()
        .map(|(row, value)| {
            label_encoder
                .encode(value)
                .map_err(|e| in_column(&label_name, in_row(row, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        rows = table.len(),
        features = features.len(),
        context_width = width,
        label = %label_name,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Transformed table"
    );

    Ok(EncodedTable {
        feature_names: features.into_iter().map(|f| f.name).collect(),
        contexts,
        labels,
        label_encoder,
    })
}

fn in_row(row: usize, err: SimError) -> SimError {
    match err {
        SimError::Encoding(msg) => SimError::encoding(format!("row {row}: {msg}")),
        other => other,
    }
}

fn in_column(name: &str, err: SimError) -> SimError {
    match err {
        SimError::Encoding(msg) => SimError::encoding(format!("column '{name}', {msg}")),
        other => other,
    }
}
