use serde::{Deserialize, Serialize};

use crate::error::DesignerError;
use crate::model::{FieldType, TableOptions};

/// Defaults applied to entities the designer creates on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DesignerConfig {
    pub default_table_name: String,
    pub default_field_name: String,
    pub default_field_type: FieldType,
    pub default_options: TableOptions,
    /// Diagonal shift applied when a new table would land exactly on an
    /// existing one.
    pub placement_step: f64,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            default_table_name: "NewTable".to_string(),
            default_field_name: "field".to_string(),
            default_field_type: FieldType::Integer,
            default_options: TableOptions::default(),
            placement_step: 32.0, // Canvas grid gap
        }
    }
}

impl DesignerConfig {
    pub fn from_json(input: &str) -> Result<Self, DesignerError> {
        serde_json::from_str(input).map_err(DesignerError::Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DesignerConfig::default();
        assert_eq!(config.default_table_name, "NewTable");
        assert_eq!(config.default_field_name, "field");
        assert_eq!(config.default_field_type, FieldType::Integer);
        assert!(config.default_options.has_auto_id);
        assert!(config.default_options.timestamps);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = DesignerConfig::from_json(r#"{ "defaultTableName": "Model" }"#).unwrap();
        assert_eq!(config.default_table_name, "Model");
        assert_eq!(config.default_field_name, "field");
        assert_eq!(config.placement_step, 32.0);
    }

    #[test]
    fn test_bad_json_is_a_config_error() {
        let err = DesignerConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, DesignerError::Config(_)));
        assert!(err.to_string().starts_with("Invalid config:"));

        let err = DesignerConfig::from_json(r#"{ "placementStep": "wide" }"#).unwrap_err();
        assert!(matches!(err, DesignerError::Config(_)));
    }
}
