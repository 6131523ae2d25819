//! # Configuration
//!
//! Run-level settings loaded from a TOML file. Every field has a default, so
//! an empty file (or no file at all) gives a usable configuration reading the
//! catalog from the current directory.
//!
//! ```toml
//! extrapolation_pct = 30.0
//! categories = ["envelope", "lighting", "heating_cooling", "shw", "ventilation", "renewables"]
//!
//! [catalog]
//! dir = "data/costing"
//! costs = "costs.csv"
//!
//! [default_locale]
//! province_state = "ON"
//! city = "Toronto"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::aggregator::DEFAULT_CATEGORIES;
use crate::errors::{CostError, CostResult};
use crate::localization::Locale;

/// Default extrapolation band for cost curves, in percent
pub const DEFAULT_EXTRAPOLATION_PCT: f64 = 30.0;

/// The catalog tables, in load order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogTable {
    Costs,
    LocalizationFactors,
    Locations,
    Equipment,
    Assemblies,
    ConstructionMaterials,
    Constructions,
}

impl CatalogTable {
    pub const ALL: [CatalogTable; 7] = [
        CatalogTable::Costs,
        CatalogTable::LocalizationFactors,
        CatalogTable::Locations,
        CatalogTable::Equipment,
        CatalogTable::Assemblies,
        CatalogTable::ConstructionMaterials,
        CatalogTable::Constructions,
    ];

    /// Table name used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            CatalogTable::Costs => "costs",
            CatalogTable::LocalizationFactors => "localization_factors",
            CatalogTable::Locations => "locations",
            CatalogTable::Equipment => "equipment",
            CatalogTable::Assemblies => "assemblies",
            CatalogTable::ConstructionMaterials => "construction_materials",
            CatalogTable::Constructions => "constructions",
        }
    }
}

impl std::fmt::Display for CatalogTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where the catalog tables live.
///
/// File names are relative to `dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogPaths {
    pub dir: PathBuf,
    pub costs: String,
    pub localization_factors: String,
    pub locations: String,
    pub equipment: String,
    pub assemblies: String,
    pub construction_materials: String,
    pub constructions: String,
}

impl Default for CatalogPaths {
    fn default() -> Self {
        CatalogPaths {
            dir: PathBuf::from("."),
            costs: "costs.csv".to_string(),
            localization_factors: "localization_factors.csv".to_string(),
            locations: "locations.csv".to_string(),
            equipment: "equipment.csv".to_string(),
            assemblies: "assemblies.csv".to_string(),
            construction_materials: "construction_materials.csv".to_string(),
            constructions: "constructions.csv".to_string(),
        }
    }
}

impl CatalogPaths {
    /// Default file names inside `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        CatalogPaths {
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// Full path of one table
    pub fn path(&self, table: CatalogTable) -> PathBuf {
        let file = match table {
            CatalogTable::Costs => &self.costs,
            CatalogTable::LocalizationFactors => &self.localization_factors,
            CatalogTable::Locations => &self.locations,
            CatalogTable::Equipment => &self.equipment,
            CatalogTable::Assemblies => &self.assemblies,
            CatalogTable::ConstructionMaterials => &self.construction_materials,
            CatalogTable::Constructions => &self.constructions,
        };
        self.dir.join(file)
    }

    /// Declared tables whose files do not exist
    pub fn missing(&self) -> Vec<PathBuf> {
        CatalogTable::ALL
            .iter()
            .map(|t| self.path(*t))
            .filter(|p| !p.exists())
            .collect()
    }
}

/// Top-level costing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostingConfig {
    pub catalog: CatalogPaths,
    /// Extrapolation band for cost curves, in percent of the curve's range ends
    pub extrapolation_pct: f64,
    /// Locale used when an audit does not name one
    pub default_locale: Option<Locale>,
    /// Category tags the aggregator reports on
    pub categories: Vec<String>,
}

impl Default for CostingConfig {
    fn default() -> Self {
        CostingConfig {
            catalog: CatalogPaths::default(),
            extrapolation_pct: DEFAULT_EXTRAPOLATION_PCT,
            default_locale: None,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl CostingConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> CostResult<Self> {
        let config: CostingConfig = toml::from_str(text).map_err(|e| CostError::ConfigError {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })?;
        config.validated("<inline>")
    }

    /// Load configuration from a TOML file.
    ///
    /// A relative `catalog.dir` is resolved against the config file's
    /// directory.
    pub fn from_file(path: impl AsRef<Path>) -> CostResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CostError::file_error("read", path.display().to_string(), e.to_string())
        })?;
        let mut config: CostingConfig =
            toml::from_str(&text).map_err(|e| CostError::ConfigError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        if config.catalog.dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.catalog.dir = parent.join(&config.catalog.dir);
            }
        }
        config.validated(&path.display().to_string())
    }

    fn validated(self, origin: &str) -> CostResult<Self> {
        if !self.extrapolation_pct.is_finite() || self.extrapolation_pct < 0.0 {
            return Err(CostError::ConfigError {
                path: origin.to_string(),
                reason: format!(
                    "extrapolation_pct must be a non-negative number, got {}",
                    self.extrapolation_pct
                ),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CostingConfig::from_toml_str("").unwrap();
        assert_eq!(config, CostingConfig::default());
        assert_eq!(config.extrapolation_pct, 30.0);
        assert_eq!(config.categories.len(), 6);
        assert!(config.default_locale.is_none());
    }

    #[test]
    fn test_partial_config() {
        let config = CostingConfig::from_toml_str(
            r#"
            extrapolation_pct = 50.0
            categories = ["envelope"]

            [catalog]
            dir = "/data/costing"
            costs = "master_costs.csv"

            [default_locale]
            province_state = "ON"
            city = "Toronto"
            "#,
        )
        .unwrap();
        assert_eq!(config.extrapolation_pct, 50.0);
        assert_eq!(config.categories, vec!["envelope".to_string()]);
        assert_eq!(
            config.catalog.path(CatalogTable::Costs),
            PathBuf::from("/data/costing/master_costs.csv")
        );
        assert_eq!(
            config.catalog.path(CatalogTable::Equipment),
            PathBuf::from("/data/costing/equipment.csv")
        );
        assert_eq!(config.default_locale, Some(Locale::new("ON", "Toronto")));
    }

    #[test]
    fn test_negative_band_rejected() {
        let err = CostingConfig::from_toml_str("extrapolation_pct = -5.0").unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_malformed_toml() {
        let err = CostingConfig::from_toml_str("extrapolation_pct = \"lots\"").unwrap_err();
        assert!(err.is_load_time());
    }

    #[test]
    fn test_relative_dir_resolves_against_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("costing.toml");
        std::fs::write(&path, "[catalog]\ndir = \"tables\"\n").unwrap();
        let config = CostingConfig::from_file(&path).unwrap();
        assert_eq!(config.catalog.dir, dir.path().join("tables"));
    }

    #[test]
    fn test_missing_tables_listed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("costs.csv"), "id\n").unwrap();
        let paths = CatalogPaths::in_dir(dir.path());
        let missing = paths.missing();
        assert_eq!(missing.len(), 6);
        assert!(!missing.contains(&dir.path().join("costs.csv")));
    }
}
