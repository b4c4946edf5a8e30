use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dsl::{DEFAULT_INTERVAL_SEPARATOR, DEFAULT_LIST_SEPARATOR, RelationalOperator};
use crate::value::FieldType;

/// Plan declaration as written in YAML.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlanConfig {
    #[serde(default = "default_list_separator")]
    pub list_separator: String,
    #[serde(default = "default_interval_separator")]
    pub interval_separator: String,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

impl PlanConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            list_separator: default_list_separator(),
            interval_separator: default_interval_separator(),
            fields: Vec::new(),
        }
    }
}

fn default_list_separator() -> String {
    DEFAULT_LIST_SEPARATOR.to_string()
}

fn default_interval_separator() -> String {
    DEFAULT_INTERVAL_SEPARATOR.to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_operator: Option<RelationalOperator>,
    #[serde(default)]
    pub case_sensitive: bool,
    /// Name of a registered converter overriding the type's default one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
}
