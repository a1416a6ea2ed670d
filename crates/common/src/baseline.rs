//! Baseline catalog loading from YAML files
//!
//! The catalog names the provider lists that drive classification and
//! compliance: providers Azure registers by default, deprecated providers,
//! the landing zone required/recommended baselines, and the subscription
//! archetype tiers. A built-in catalog is embedded in the binary; a custom one
//! can be loaded from disk.

use crate::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../baseline/default.yaml");

/// Root structure for baseline catalog YAML files
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BaselineCatalog {
    /// Catalog format version
    pub version: u32,
    /// Providers Azure registers on every subscription automatically
    #[serde(default)]
    pub auto_registered: Vec<String>,
    /// Providers that are retired or scheduled for retirement
    #[serde(default)]
    pub deprecated: Vec<String>,
    /// Providers required for a landing zone subscription
    #[serde(default)]
    pub required: Vec<String>,
    /// Providers recommended for a landing zone subscription
    #[serde(default)]
    pub recommended: Vec<String>,
    /// Named archetype tiers; a provider may appear in several
    #[serde(default)]
    pub tiers: Vec<BaselineTier>,
}

/// A named list of providers for one subscription archetype
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BaselineTier {
    pub name: String,
    pub providers: Vec<String>,
}

impl BaselineCatalog {
    /// The catalog shipped with the tool
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_CATALOG)
    }

    /// Load a catalog from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ReportError::Baseline(format!(
                "Failed to read baseline file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content).map_err(|e| {
            ReportError::Baseline(format!(
                "Failed to parse baseline YAML from {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Parse a catalog from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let catalog: Self = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Serialize the catalog back to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ReportError::Baseline(format!(
                "Unsupported baseline version: {}",
                self.version
            )));
        }

        let lists = [
            ("auto_registered", &self.auto_registered),
            ("deprecated", &self.deprecated),
            ("required", &self.required),
            ("recommended", &self.recommended),
        ];
        for (name, list) in lists {
            if list.iter().any(|p| p.trim().is_empty()) {
                return Err(ReportError::Baseline(format!(
                    "Empty provider namespace in '{}' list",
                    name
                )));
            }
        }

        for tier in &self.tiers {
            if tier.name.trim().is_empty() {
                return Err(ReportError::Baseline("Tier with empty name".to_string()));
            }
            if tier.providers.iter().any(|p| p.trim().is_empty()) {
                return Err(ReportError::Baseline(format!(
                    "Empty provider namespace in tier '{}'",
                    tier.name
                )));
            }
        }

        Ok(())
    }

    pub fn is_auto_registered(&self, namespace: &str) -> bool {
        self.auto_registered.iter().any(|p| p == namespace)
    }

    pub fn is_deprecated(&self, namespace: &str) -> bool {
        self.deprecated.iter().any(|p| p == namespace)
    }

    /// Names of every tier listing this namespace, in catalog order
    pub fn tiers_for(&self, namespace: &str) -> Vec<&str> {
        self.tiers
            .iter()
            .filter(|tier| tier.providers.iter().any(|p| p == namespace))
            .map(|tier| tier.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version: 1
auto_registered: [Microsoft.Authorization]
deprecated: [Microsoft.ClassicCompute]
required: [Microsoft.Network, Microsoft.KeyVault]
tiers:
  - name: Platform Connectivity
    providers: [Microsoft.Network]
  - name: Landing Zone Public
    providers: [Microsoft.Network, Microsoft.Web]
"#;

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = BaselineCatalog::builtin().unwrap();

        assert!(catalog.is_auto_registered("Microsoft.Authorization"));
        assert!(catalog.is_deprecated("Microsoft.ClassicCompute"));
        assert!(!catalog.required.is_empty());
        assert!(!catalog.tiers.is_empty());
    }

    #[test]
    fn test_parse_sample() {
        let catalog = BaselineCatalog::from_yaml(SAMPLE).unwrap();

        assert_eq!(catalog.required, vec!["Microsoft.Network", "Microsoft.KeyVault"]);
        assert!(catalog.recommended.is_empty());
        assert_eq!(
            catalog.tiers_for("Microsoft.Network"),
            vec!["Platform Connectivity", "Landing Zone Public"]
        );
        assert_eq!(catalog.tiers_for("Microsoft.Web"), vec!["Landing Zone Public"]);
        assert!(catalog.tiers_for("Microsoft.Sql").is_empty());
    }

    #[test]
    fn test_lookups_are_case_sensitive() {
        let catalog = BaselineCatalog::builtin().unwrap();

        assert!(catalog.is_auto_registered("microsoft.support"));
        assert!(!catalog.is_auto_registered("Microsoft.Support"));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let result = BaselineCatalog::from_yaml("version: 2\n");
        assert!(matches!(result, Err(ReportError::Baseline(_))));
    }

    #[test]
    fn test_rejects_empty_namespace() {
        let result = BaselineCatalog::from_yaml("version: 1\nrequired: [\"\"]\n");
        assert!(matches!(result, Err(ReportError::Baseline(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.yaml");
        fs::write(&path, SAMPLE).unwrap();

        let catalog = BaselineCatalog::load(&path).unwrap();
        assert_eq!(catalog.tiers.len(), 2);

        let missing = BaselineCatalog::load(&dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(ReportError::Baseline(_))));
    }

    #[test]
    fn test_yaml_round_trip() {
        let catalog = BaselineCatalog::from_yaml(SAMPLE).unwrap();
        let yaml = catalog.to_yaml().unwrap();
        assert_eq!(BaselineCatalog::from_yaml(&yaml).unwrap(), catalog);
    }
}
