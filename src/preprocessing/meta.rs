//! Per-column configuration and its resolution.
//!
//! A table is configured with one default [`ColumnMeta`] plus optional
//! per-column overrides. [`resolve_columns`] merges them field by field into
//! one [`ResolvedMeta`] per column and enforces the single-label rule.

use super::encoders::Encoder;
use crate::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Partial column configuration. Unset fields fall back to the default meta,
/// then to `ignore = false`, `label = false`, `encoding = inferred`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    #[serde(default)]
    pub ignore: Option<bool>,
    #[serde(default)]
    pub label: Option<bool>,
    #[serde(default)]
    pub encoding: Option<Encoder>,
}

impl ColumnMeta {
    /// A fully specified meta, typically used as the table default.
    pub fn full(ignore: bool, label: bool, encoding: Encoder) -> Self {
        Self {
            ignore: Some(ignore),
            label: Some(label),
            encoding: Some(encoding),
        }
    }

    pub fn encoding(encoding: Encoder) -> Self {
        Self {
            encoding: Some(encoding),
            ..Self::default()
        }
    }

    pub fn ignored() -> Self {
        Self {
            ignore: Some(true),
            ..Self::default()
        }
    }

    pub fn label(encoding: Option<Encoder>) -> Self {
        Self {
            label: Some(true),
            encoding,
            ..Self::default()
        }
    }

    /// Field-by-field merge where `self` takes precedence over `fallback`.
    fn or(&self, fallback: &Self) -> Self {
        Self {
            ignore: self.ignore.or(fallback.ignore),
            label: self.label.or(fallback.label),
            encoding: self
                .encoding
                .clone()
                .or_else(|| fallback.encoding.clone()),
        }
    }
}

/// The final directive for one column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedMeta {
    pub ignore: bool,
    pub label: bool,
    pub encoder: Encoder,
}

/// Identifies a column by header name or by position.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnKey {
    Index(usize),
    Name(String),
}

impl ColumnKey {
    /// Finds the column this key refers to. Names are matched against the
    /// header first; a name that matches nothing but parses as an integer is
    /// treated as a position.
    pub fn locate(&self, header: Option<&[String]>, width: usize) -> Option<usize> {
        let index = match self {
            Self::Index(i) => Some(*i),
            Self::Name(name) => header
                .and_then(|h| h.iter().position(|c| c == name))
                .or_else(|| name.trim().parse::<usize>().ok()),
        };
        index.filter(|i| *i < width)
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Name(name) => write!(f, "'{name}'"),
        }
    }
}

impl From<usize> for ColumnKey {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

impl From<&str> for ColumnKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for ColumnKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// Per-column overrides, ordered so resolution is deterministic.
pub type ColumnOverrides = BTreeMap<ColumnKey, ColumnMeta>;

/// Resolve every column of a `width`-wide table.
///
/// # Errors
///
/// Returns [`SimError::Configuration`] if an override or `label_column`
/// matches no column, two override keys target the same column, no column or
/// more than one column ends up as the label, or the label column is ignored.
pub fn resolve_columns(
    header: Option<&[String]>,
    width: usize,
    default_meta: &ColumnMeta,
    overrides: &ColumnOverrides,
    label_column: Option<&ColumnKey>,
) -> Result<Vec<ResolvedMeta>> {
    let mut per_column: Vec<Option<&ColumnMeta>> = vec![None; width];
    for (key, meta) in overrides {
        let index = key
            .locate(header, width)
            .ok_or_else(|| SimError::config(format!("Column override {key} matches no column")))?;
        let slot = per_column
            .get_mut(index)
            .ok_or_else(|| SimError::config(format!("Column override {key} is out of range")))?;
        if slot.replace(meta).is_some() {
            return Err(SimError::config(format!(
                "Column {index} has more than one override"
            )));
        }
    }

    let label_index = label_column
        .map(|key| {
            key.locate(header, width)
                .ok_or_else(|| SimError::config(format!("Label column {key} matches no column")))
        })
        .transpose()?;

    let resolved: Vec<ResolvedMeta> = per_column
        .iter()
        .enumerate()
        .map(|(i, column_meta)| {
            let merged = column_meta.map_or_else(|| default_meta.clone(), |m| m.or(default_meta));
            ResolvedMeta {
                ignore: merged.ignore.unwrap_or(false),
                label: merged.label.unwrap_or(false) || label_index == Some(i),
                encoder: merged.encoding.unwrap_or_default(),
            }
        })
        .collect();

    let labels: Vec<usize> = resolved
        .iter()
        .enumerate()
        .filter(|(_, m)| m.label)
        .map(|(i, _)| i)
        .collect();

    match labels.as_slice() {
        [] => Err(SimError::config(
            "No label column: mark one column with label=true or pass a label column",
        )),
        [only] => {
            if resolved.get(*only).is_some_and(|m| m.ignore) {
                return Err(SimError::config(format!(
                    "Label column {only} is also marked ignore"
                )));
            }
            Ok(resolved)
        }
        many => Err(SimError::config(format!(
            "Expected exactly one label column, found {} ({many:?})",
            many.len()
        ))),
    }
}
