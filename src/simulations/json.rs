//! Declarative simulation configuration.
//!
//! ```json
//! {
//!   "type": "classification",
//!   "from": {
//!     "format": "table",
//!     "table": [["a","b","c"], ["s1","2","3"], ["s2","5","6"]],
//!     "has_header": true,
//!     "column_default": { "ignore": false, "label": false, "encoding": "factor" },
//!     "column_overrides": { "b": { "label": true, "encoding": "string" } }
//!   }
//! }
//! ```
//!
//! Sources are tagged by `format`: `table` (inline rows), `csv` (a location
//! with an optional `md5_checksum`) or `openml` (a dataset `id`).

use super::classification::TableSimulation;
use crate::context::ExecutionContext;
use crate::error::{Result, ResultExt as _};
use crate::integrity::Checksum;
use crate::preprocessing::{ColumnKey, ColumnMeta, RawTable, TableOptions};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

fn default_true() -> bool {
    true
}

/// Column settings shared by the `table` and `csv` formats.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ColumnConfig {
    #[serde(default = "default_true")]
    pub has_header: bool,
    #[serde(default)]
    pub column_default: ColumnMeta,
    /// Keyed by header name, or by position written as a string.
    #[serde(default)]
    pub column_overrides: BTreeMap<String, ColumnMeta>,
    #[serde(default)]
    pub label_column: Option<ColumnKey>,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            has_header: true,
            column_default: ColumnMeta::default(),
            column_overrides: BTreeMap::new(),
            label_column: None,
        }
    }
}

impl ColumnConfig {
    pub fn to_options(&self) -> TableOptions {
        TableOptions {
            has_header: self.has_header,
            default_meta: self.column_default.clone(),
            overrides: self
                .column_overrides
                .iter()
                .map(|(key, meta)| (ColumnKey::Name(key.clone()), meta.clone()))
                .collect(),
            label_column: self.label_column.clone(),
        }
    }
}

/// Inline rows; cells may be JSON strings, numbers, booleans or null.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TableSource {
    pub table: Vec<Vec<serde_json::Value>>,
    #[serde(flatten)]
    pub columns: ColumnConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CsvSource {
    pub location: String,
    #[serde(default)]
    pub md5_checksum: Option<String>,
    #[serde(flatten)]
    pub columns: ColumnConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct OpenMlSource {
    pub id: u64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum SourceConfig {
    Table(TableSource),
    Csv(CsvSource),
    #[serde(rename = "openml")]
    OpenMl(OpenMlSource),
}

impl SourceConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn build(&self, ctx: &ExecutionContext) -> Result<TableSimulation> {
        match self {
            Self::Table(TableSource { table, columns }) => ctx.in_scope(|| {
                let raw = RawTable::from_json_rows(table, columns.has_header)?;
                TableSimulation::from_raw(&raw, &columns.to_options())
            }),
            Self::Csv(CsvSource {
                location,
                md5_checksum,
                columns,
            }) => {
                let checksum = md5_checksum.as_deref().map(Checksum::md5).transpose()?;
                TableSimulation::from_csv(ctx, location, checksum.as_ref(), &columns.to_options())
            }
            Self::OpenMl(OpenMlSource { id }) => TableSimulation::from_openml(ctx, *id),
        }
    }
}

/// A complete simulation description.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SimulationConfig {
    Classification { from: SourceConfig },
}

impl SimulationConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn source(&self) -> &SourceConfig {
        match self {
            Self::Classification { from } => from,
        }
    }

    pub fn build(&self, ctx: &ExecutionContext) -> Result<TableSimulation> {
        self.source().build(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::preprocessing::{Encoded, Encoder, Scalar};
    use crate::simulations::Simulation as _;

    const TABLE_SOURCE: &str = r#"{
        "format"          : "table",
        "table"           : [["a","b","c"], ["s1","2","3"], ["s2","5","6"]],
        "has_header"      : true,
        "column_default"  : { "ignore":false, "label":false, "encoding":"factor" },
        "column_overrides": { "b": { "label":true, "encoding":"string" } }
    }"#;

    #[test]
    fn test_table_source() {
        let ctx = ExecutionContext::new();
        let sim = SourceConfig::from_json(TABLE_SOURCE).unwrap().build(&ctx).unwrap();

        let interactions = sim.interactions();
        assert_eq!(interactions.len(), 2);
        assert_eq!(
            interactions[0].context(),
            Some(&vec![Scalar::Int(1), Scalar::Int(1)])
        );
        assert_eq!(
            interactions[1].context(),
            Some(&vec![Scalar::Int(2), Scalar::Int(2)])
        );
        assert_eq!(
            interactions[0].actions(),
            &[
                Encoded::Scalar(Scalar::text("2")),
                Encoded::Scalar(Scalar::text("5"))
            ]
        );
    }

    #[test]
    fn test_parses_each_format() {
        let csv: SourceConfig = serde_json::from_str(
            r#"{"format":"csv","location":"http://x/t.csv","md5_checksum":"4fbb00ba35dd05a29be1f52b7e0faeb6",
                "column_default":{"encoding":"numeric"},"label_column":"class"}"#,
        )
        .unwrap();
        match csv {
            SourceConfig::Csv(CsvSource {
                location,
                md5_checksum,
                columns,
            }) => {
                assert_eq!(location, "http://x/t.csv");
                assert!(md5_checksum.is_some());
                assert!(columns.has_header);
                assert_eq!(columns.column_default.encoding, Some(Encoder::numeric()));
                assert_eq!(columns.label_column, Some(ColumnKey::Name("class".to_owned())));
            }
            other => panic!("expected csv source, got {other:?}"),
        }

        let openml = SimulationConfig::from_json(
            r#"{"type":"classification","from":{"format":"openml","id":1116}}"#,
        )
        .unwrap();
        assert_eq!(openml.source(), &SourceConfig::OpenMl(OpenMlSource { id: 1116 }));
    }

    #[test]
    fn test_invalid_configs_are_configuration_errors() {
        for json in [
            r#"{"format":"parquet","location":"x"}"#,
            r#"{"format":"table","table":[["a"],["1"]],"column_default":{"encoding":"bogus"}}"#,
            r#"{"format":"openml","id":-3}"#,
            r#"{"format":"table""#,
        ] {
            assert!(
                matches!(SourceConfig::from_json(json), Err(SimError::Configuration(_))),
                "{json}"
            );
        }

        assert!(matches!(
            SimulationConfig::from_json(r#"{"type":"regression","from":{"format":"openml","id":1}}"#),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn test_bad_checksum_is_rejected_before_fetching() {
        let ctx = ExecutionContext::new().with_fetcher(|_: &str| -> Result<Vec<u8>> {
            panic!("should not fetch")
        });
        let source: SourceConfig =
            serde_json::from_str(r#"{"format":"csv","location":"x","md5_checksum":"xyz"}"#)
                .unwrap();
        assert!(matches!(source.build(&ctx), Err(SimError::Configuration(_))));
    }
}
