//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    let inspection = &config.inspection;

    if inspection.table_types.is_empty() {
        return Err(MigrateError::Config(
            "inspection.table_types must list at least one table type".into(),
        ));
    }
    if inspection.table_types.iter().any(|t| t.trim().is_empty()) {
        return Err(MigrateError::Config(
            "inspection.table_types cannot contain blank entries".into(),
        ));
    }
    if inspection.object_types.is_empty() {
        return Err(MigrateError::Config(
            "inspection.object_types must list at least one object type".into(),
        ));
    }

    // Filters end up as bind values; a NUL byte is never a legitimate name
    for (field, value) in [
        ("catalog", &inspection.catalog),
        ("schema", &inspection.schema),
        ("table", &inspection.table),
    ] {
        if let Some(value) = value {
            if value.contains('\0') {
                return Err(MigrateError::Config(format!(
                    "SECURITY: inspection.{} contains null byte: {:?}",
                    field, value
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InspectionConfig;

    fn valid_config() -> Config {
        Config {
            inspection: InspectionConfig {
                schema: Some("public".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_table_types() {
        let mut config = valid_config();
        config.inspection.table_types.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_blank_table_type() {
        let mut config = valid_config();
        config.inspection.table_types.push("  ".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_object_types() {
        let mut config = valid_config();
        config.inspection.object_types.clear();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("object_types"));
    }

    #[test]
    fn test_null_byte_in_filter() {
        let mut config = valid_config();
        config.inspection.table = Some("orders\0".to_string());
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("null byte"));
    }
}
