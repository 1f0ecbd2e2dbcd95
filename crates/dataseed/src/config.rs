//! Generator configuration loading and validation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DataseedError, Result};

/// Configuration for one helper generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Name of the generated helper (module/type name in the output).
    pub helper_name: String,

    /// Path the rendered source file is written to.
    pub output_path: PathBuf,

    /// Named alternate datasets, one generated section per flavor.
    #[serde(default)]
    pub flavors: Vec<Flavor>,
}

/// A named alternate dataset backed by one workbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flavor {
    pub name: String,

    /// Workbook file the flavor's data is read from.
    pub workbook_path: PathBuf,
}

impl GeneratorConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: GeneratorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// An empty flavor list is allowed; generation is then a no-op.
    pub fn validate(&self) -> Result<()> {
        if self.helper_name.trim().is_empty() {
            return Err(DataseedError::Config("helper_name must not be empty".to_string()));
        }

        let mut seen = HashSet::new();
        for flavor in &self.flavors {
            if flavor.name.trim().is_empty() {
                return Err(DataseedError::Config("flavor name must not be empty".to_string()));
            }
            if !seen.insert(flavor.name.as_str()) {
                return Err(DataseedError::Config(format!(
                    "duplicate flavor name '{}'",
                    flavor.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_round_trip() {
        let yaml = r#"
helper_name: SeedData
output_path: out/seed_data.rs
flavors:
  - name: Default
    workbook_path: data/default.xlsx
  - name: Large
    workbook_path: data/large.xlsx
"#;
        let config = GeneratorConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.helper_name, "SeedData");
        assert_eq!(config.flavors.len(), 2);
        assert_eq!(config.flavors[1].name, "Large");
    }

    #[test]
    fn test_missing_flavors_defaults_to_empty() {
        let config = GeneratorConfig::from_yaml("helper_name: Seed\noutput_path: out.rs\n").unwrap();
        assert!(config.flavors.is_empty());
    }

    #[test]
    fn test_validation_failures() {
        assert!(GeneratorConfig::from_yaml("helper_name: '  '\noutput_path: out.rs\n").is_err());

        let dup = r#"
helper_name: Seed
output_path: out.rs
flavors:
  - name: A
    workbook_path: a.xlsx
  - name: A
    workbook_path: b.xlsx
"#;
        assert!(GeneratorConfig::from_yaml(dup).is_err());
    }
}
