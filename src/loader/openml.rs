//! OpenML datasets.
//!
//! A dataset id resolves to three documents under the configured base URL:
//!
//! - `api/v1/json/data/{id}`: the description, naming the CSV `file_id`
//!   and the default target attribute
//! - `api/v1/json/data/features/{id}`: per-column type and role flags
//! - `data/v1/get_csv/{file_id}`: the table itself
//!
//! The feature list decides each column's meta, so OpenML tables need no
//! hand-written configuration.

use super::TableLoader;
use crate::context::ExecutionContext;
use crate::error::{Result, SimError};
use crate::preprocessing::{ColumnMeta, Encoder, TableOptions};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct DescriptionEnvelope {
    data_set_description: Description,
}

#[derive(Debug, Deserialize)]
struct Description {
    #[serde(default)]
    name: Option<String>,
    file_id: String,
    #[serde(default)]
    default_target_attribute: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeaturesEnvelope {
    data_features: FeatureList,
}

#[derive(Debug, Deserialize)]
struct FeatureList {
    feature: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    name: String,
    data_type: String,
    #[serde(default)]
    is_target: Flag,
    #[serde(default)]
    is_ignore: Flag,
    #[serde(default)]
    is_row_identifier: Flag,
}

/// OpenML encodes booleans as the strings `"true"`/`"false"`.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(from = "serde_json::Value")]
struct Flag(bool);

impl From<serde_json::Value> for Flag {
    fn from(value: serde_json::Value) -> Self {
        Self(match value {
            serde_json::Value::Bool(b) => b,
            serde_json::Value::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        })
    }
}

impl Feature {
    fn meta(&self) -> ColumnMeta {
        if self.is_ignore.0 || self.is_row_identifier.0 {
            return ColumnMeta::ignored();
        }

        let encoding = match self.data_type.as_str() {
            "nominal" => Encoder::one_hot(),
            "numeric" | "integer" | "real" => Encoder::numeric(),
            // string and date columns carry no usable context
            _ if !self.is_target.0 => return ColumnMeta::ignored(),
            _ => Encoder::string(),
        };

        ColumnMeta {
            ignore: Some(false),
            label: Some(self.is_target.0),
            encoding: Some(encoding),
        }
    }
}

/// A downloaded OpenML table plus the column options derived for it.
#[derive(Clone, Debug)]
pub struct OpenMlDataset {
    pub id: u64,
    pub name: Option<String>,
    pub rows: Vec<Vec<String>>,
    pub options: TableOptions,
}

impl OpenMlDataset {
    /// # Errors
    ///
    /// [`SimError::Configuration`] for id 0 and for datasets without exactly
    /// one target column.
    pub fn load(ctx: &ExecutionContext, id: u64) -> Result<Self> {
        if id == 0 {
            return Err(SimError::config("OpenML dataset ids start at 1"));
        }

        ctx.in_scope(|| {
            let loader = TableLoader::new(ctx);
            let base = ctx.openml_base_url();

            let description: DescriptionEnvelope = serde_json::from_slice(
                &loader.fetch(&format!("{base}/api/v1/json/data/{id}"))?,
            )?;
            let features: FeaturesEnvelope = serde_json::from_slice(
                &loader.fetch(&format!("{base}/api/v1/json/data/features/{id}"))?,
            )?;

            let description = description.data_set_description;
            let options = derive_options(
                &features.data_features.feature,
                description.default_target_attribute.as_deref(),
            )
            .map_err(|e| match e {
                SimError::Configuration(msg) => {
                    SimError::Configuration(format!("OpenML dataset {id}: {msg}"))
                }
                other => other,
            })?;

            let rows = loader.load_csv(
                &format!("{base}/data/v1/get_csv/{}", description.file_id),
                None,
            )?;

            tracing::info!(
                id,
                name = description.name.as_deref().unwrap_or(""),
                rows = rows.len().saturating_sub(1),
                "Loaded OpenML dataset"
            );

            Ok(Self {
                id,
                name: description.name,
                rows,
                options,
            })
        })
    }
}

fn derive_options(features: &[Feature], default_target: Option<&str>) -> Result<TableOptions> {
    let flagged: Vec<&str> = features
        .iter()
        .filter(|f| f.is_target.0)
        .map(|f| f.name.as_str())
        .collect();

    let target = match (flagged.as_slice(), default_target) {
        ([one], _) => (*one).to_owned(),
        ([], Some(name)) if !name.is_empty() && !name.contains(',') => name.to_owned(),
        ([], _) => return Err(SimError::config("no target column")),
        (many, _) => {
            return Err(SimError::config(format!(
                "multiple target columns: {}",
                many.join(", ")
            )));
        }
    };

    let mut options = TableOptions::new();
    for feature in features {
        let mut meta = feature.meta();
        if feature.name == target {
            meta.ignore = Some(false);
            meta.label = Some(true);
        }
        options = options.with_override(feature.name.as_str(), meta);
    }
    Ok(options.with_label(target))
}
