//! Configuration loading and validation.
//!
//! ```yaml
//! inspection:
//!   schema: public
//!   table: "order%"
//!   object_types: [table, column, primary_key, foreign_key, check]
//! translation:
//!   zero_date_time_behavior: round
//!   use_explicit_defaults: true
//! ```

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::MetaDataType;
    use std::io::Write;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.inspection.table_types, vec!["TABLE".to_string()]);
        assert_eq!(config.inspection.object_types.len(), 7);
        assert_eq!(
            config.translation.zero_date_time_behavior,
            ZeroDateTimeBehavior::Exception
        );
        assert!(!config.translation.use_explicit_defaults);
        assert!(config.translation.check_sql_mode);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "inspection:\n  catalog: shop\n  table: \"ord%\"\n  object_types: [table, column, check, auto_increment]\n\
             translation:\n  zero_date_time_behavior: convert_to_null\n  use_explicit_defaults: true\n  check_sql_mode: false"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.inspection.catalog.as_deref(), Some("shop"));
        assert_eq!(
            config.inspection.object_types,
            vec![
                MetaDataType::Table,
                MetaDataType::Column,
                MetaDataType::Check,
                MetaDataType::AutoIncrement
            ]
        );
        assert_eq!(
            config.translation.zero_date_time_behavior,
            ZeroDateTimeBehavior::ConvertToNull
        );
        assert!(!config.translation.check_sql_mode);

        let scope = config.inspection.scope();
        assert_eq!(scope.table.as_deref(), Some("ord%"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_invalid_behavior_rejected() {
        let err = Config::from_yaml("translation:\n  zero_date_time_behavior: ignore\n").unwrap_err();
        assert!(err.to_string().contains("YAML"));
    }

    #[test]
    fn test_yaml_round_trip_keeps_values() {
        let mut config = Config::default();
        config.translation.zero_date_time_behavior = ZeroDateTimeBehavior::Round;
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("zero_date_time_behavior: round"));
        assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_behavior_from_str() {
        assert_eq!(
            "convertToNull".parse::<ZeroDateTimeBehavior>().unwrap(),
            ZeroDateTimeBehavior::ConvertToNull
        );
        assert!("later".parse::<ZeroDateTimeBehavior>().is_err());
    }
}
