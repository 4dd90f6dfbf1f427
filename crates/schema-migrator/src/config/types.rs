//! Configuration type definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MigrateError;
use crate::inspect::{InspectionScope, MetaDataType};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// What to inspect.
    #[serde(default)]
    pub inspection: InspectionConfig,

    /// How scripts are translated.
    #[serde(default)]
    pub translation: TranslationConfig,
}

/// Inspection scope and object types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionConfig {
    /// Catalog filter (may contain `%` and `_` wildcards).
    #[serde(default)]
    pub catalog: Option<String>,

    /// Schema filter (may contain wildcards).
    #[serde(default)]
    pub schema: Option<String>,

    /// Table name filter (may contain wildcards).
    #[serde(default)]
    pub table: Option<String>,

    /// Table types to list (default: `["TABLE"]`).
    #[serde(default = "default_table_types")]
    pub table_types: Vec<String>,

    /// Object types to inspect (default: catalog through foreign keys).
    #[serde(default = "default_object_types")]
    pub object_types: Vec<MetaDataType>,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            schema: None,
            table: None,
            table_types: default_table_types(),
            object_types: default_object_types(),
        }
    }
}

impl InspectionConfig {
    /// Scope built from the configured filters.
    pub fn scope(&self) -> InspectionScope {
        InspectionScope {
            catalog: self.catalog.clone(),
            schema: self.schema.clone(),
            table: self.table.clone(),
            table_types: self.table_types.clone(),
        }
    }
}

/// Script translation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Handling of MySQL zero dates such as `0000-00-00` (default: exception).
    #[serde(default)]
    pub zero_date_time_behavior: ZeroDateTimeBehavior,

    /// Materialize MySQL implicit defaults for NOT NULL columns (default: false).
    #[serde(default)]
    pub use_explicit_defaults: bool,

    /// Skip implicit defaults when the server runs in strict SQL mode
    /// (default: true).
    #[serde(default = "default_true")]
    pub check_sql_mode: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            zero_date_time_behavior: ZeroDateTimeBehavior::default(),
            use_explicit_defaults: false,
            check_sql_mode: true,
        }
    }
}

/// What to do with a zero date-time literal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroDateTimeBehavior {
    /// Replace with the minimum representable date/time.
    Round,
    /// Replace with NULL where the column allows it.
    ConvertToNull,
    /// Refuse to translate.
    #[default]
    Exception,
}

impl ZeroDateTimeBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZeroDateTimeBehavior::Round => "round",
            ZeroDateTimeBehavior::ConvertToNull => "convert_to_null",
            ZeroDateTimeBehavior::Exception => "exception",
        }
    }
}

impl fmt::Display for ZeroDateTimeBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZeroDateTimeBehavior {
    type Err = MigrateError;

    /// Accepts snake case and the JDBC URL spelling (`convertToNull`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('_', "").to_ascii_lowercase().as_str() {
            "round" => Ok(ZeroDateTimeBehavior::Round),
            "converttonull" => Ok(ZeroDateTimeBehavior::ConvertToNull),
            "exception" => Ok(ZeroDateTimeBehavior::Exception),
            other => Err(MigrateError::Config(format!(
                "unknown zero date-time behavior '{}', expected round, convert_to_null or exception",
                other
            ))),
        }
    }
}

fn default_table_types() -> Vec<String> {
    vec!["TABLE".to_string()]
}

fn default_object_types() -> Vec<MetaDataType> {
    vec![
        MetaDataType::Catalog,
        MetaDataType::Schema,
        MetaDataType::Table,
        MetaDataType::Column,
        MetaDataType::PrimaryKey,
        MetaDataType::Index,
        MetaDataType::ForeignKey,
    ]
}

fn default_true() -> bool {
    true
}
