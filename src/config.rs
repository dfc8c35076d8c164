//! Engine configuration
//!
//! Module weights, rubric maxima and deviation cutoffs for both composite
//! indices, plus the unit of the riparian area columns. Defaults reproduce the
//! standard UIM/REFI definitions; a JSON file may override any part.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::habitat_units::AreaUnit;
use crate::metrics::{default_refi_spec, default_uim_spec, CompositeSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_uim_spec")]
    pub uim: CompositeSpec,

    #[serde(default = "default_refi_spec")]
    pub refi: CompositeSpec,

    #[serde(default)]
    pub riparian_area_unit: AreaUnit,

    /// Fan records out across the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            uim: default_uim_spec(),
            refi: default_refi_spec(),
            riparian_area_unit: AreaUnit::default(),
            parallel: default_parallel(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read index config file: {:?}", path))?;

        let config: EngineConfig = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse index config JSON")?;

        config.validate()?;
        tracing::info!(
            "Loaded index config {:?} ({} UIM modules, {} REFI modules)",
            path,
            config.uim.modules.len(),
            config.refi.modules.len()
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.uim.validate("uim")?;
        self.refi.validate("refi")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::normalization::Normalization;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.uim.modules.len(), 4);
        assert_eq!(config.refi.modules.len(), 3);
        assert_eq!(config.riparian_area_unit, AreaUnit::Acres);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let json = r#"{ "riparian_area_unit": "square_feet", "parallel": false }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.riparian_area_unit, AreaUnit::SquareFeet);
        assert!(!config.parallel);
        assert_eq!(config.uim, default_uim_spec());
        assert_eq!(config.refi, default_refi_spec());
    }

    #[test]
    fn test_custom_refi_weights_from_json() {
        let json = r#"{
            "refi": {
                "modules": [
                    { "name": "instream_process", "weight": 2.0,
                      "metrics": [ { "field": "streambank", "normalization": { "kind": "rubric", "max": 15.0 } } ] },
                    { "name": "habitat",
                      "metrics": [ { "field": "canopy", "normalization": { "kind": "rubric", "max": 15.0 } } ] },
                    { "name": "connectivity",
                      "metrics": [ { "field": "lateral_connectivity", "normalization": { "kind": "rubric", "max": 15.0 } } ] }
                ]
            }
        }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.refi.modules[0].weight, 2.0);
        assert_eq!(config.refi.modules[1].weight, 1.0);
        assert_eq!(config.refi.modules[1].metrics[0].normalization, Normalization::rubric(15.0));
    }

    #[test]
    fn test_load_missing_file_errors() {
        let err = EngineConfig::load(Path::new("/nonexistent/index_config.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read index config file"));
    }
}
