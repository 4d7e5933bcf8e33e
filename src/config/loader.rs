//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading a rate scheme
//! from YAML files, either from a directory or from the copy embedded in the
//! binary.

use rust_decimal::Decimal;
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::{AgeCategory, EmploymentType};

use super::types::{
    PensionRates, RatesConfig, SchemeConfig, SchemeMetadata, StandardRemunerationBand,
    StandardRemunerationConfig, WithholdingTable,
};

const EMBEDDED_SCHEME: &str = include_str!("../../config/kanagawa_2025/scheme.yaml");
const EMBEDDED_RATES: &str = include_str!("../../config/kanagawa_2025/rates.yaml");
const EMBEDDED_STANDARD_REMUNERATION: &str =
    include_str!("../../config/kanagawa_2025/standard_remuneration.yaml");
const EMBEDDED_WITHHOLDING: &str = include_str!("../../config/kanagawa_2025/withholding.yaml");

/// Loads and provides access to a rate scheme.
///
/// # Directory Structure
///
/// ```text
/// config/kanagawa_2025/
/// ├── scheme.yaml                 # Scheme metadata
/// ├── rates.yaml                  # Health, pension and employment rates
/// ├── standard_remuneration.yaml  # Standard monthly remuneration grades
/// └── withholding.yaml            # Monthly withholding tax table
/// ```
///
/// # Example
///
/// ```no_run
/// use deduction_engine::config::ConfigLoader;
/// use deduction_engine::models::AgeCategory;
///
/// let loader = ConfigLoader::load("./config/kanagawa_2025").unwrap();
/// println!("Loaded scheme: {}", loader.metadata().name);
/// println!("Health rate (40-64): {}", loader.health_rate(AgeCategory::From40To64));
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: SchemeConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the scheme directory (e.g., "./config/kanagawa_2025")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - A band table has gaps or overlaps
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let metadata = Self::load_yaml::<SchemeMetadata>(&path.join("scheme.yaml"))?;
        let rates = Self::load_yaml::<RatesConfig>(&path.join("rates.yaml"))?;
        let remuneration = Self::load_yaml::<StandardRemunerationConfig>(
            &path.join("standard_remuneration.yaml"),
        )?;
        let withholding = Self::load_yaml::<WithholdingTable>(&path.join("withholding.yaml"))?;

        let config = SchemeConfig::new(metadata, rates, remuneration.bands, withholding)?;
        Ok(Self { config })
    }

    /// Loads the scheme compiled into the binary.
    ///
    /// # Example
    ///
    /// ```
    /// use deduction_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::embedded().unwrap();
    /// assert_eq!(loader.metadata().code, "kanagawa_2025");
    /// ```
    pub fn embedded() -> EngineResult<Self> {
        let metadata = Self::parse_yaml::<SchemeMetadata>(EMBEDDED_SCHEME, "embedded:scheme.yaml")?;
        let rates = Self::parse_yaml::<RatesConfig>(EMBEDDED_RATES, "embedded:rates.yaml")?;
        let remuneration = Self::parse_yaml::<StandardRemunerationConfig>(
            EMBEDDED_STANDARD_REMUNERATION,
            "embedded:standard_remuneration.yaml",
        )?;
        let withholding = Self::parse_yaml::<WithholdingTable>(
            EMBEDDED_WITHHOLDING,
            "embedded:withholding.yaml",
        )?;

        let config = SchemeConfig::new(metadata, rates, remuneration.bands, withholding)?;
        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        Self::parse_yaml(&content, &path_str)
    }

    fn parse_yaml<T: serde::de::DeserializeOwned>(content: &str, origin: &str) -> EngineResult<T> {
        serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Returns the underlying scheme configuration.
    pub fn config(&self) -> &SchemeConfig {
        &self.config
    }

    /// Returns the scheme metadata.
    pub fn metadata(&self) -> &SchemeMetadata {
        self.config.metadata()
    }

    /// Returns the total health insurance rate for an age category.
    pub fn health_rate(&self, age_category: AgeCategory) -> Decimal {
        self.config.rates().health.for_age(age_category)
    }

    /// Returns the pension rate and standard remuneration bounds.
    pub fn pension_rates(&self) -> &PensionRates {
        &self.config.rates().pension
    }

    /// Returns the employee employment insurance rate for an employment type.
    pub fn employment_rate(&self, employment_type: EmploymentType) -> Decimal {
        self.config.rates().employment.for_type(employment_type)
    }

    /// Returns the standard remuneration grades.
    pub fn standard_remuneration_bands(&self) -> &[StandardRemunerationBand] {
        self.config.standard_remuneration()
    }

    /// Returns the withholding tax table.
    pub fn withholding_table(&self) -> &WithholdingTable {
        self.config.withholding()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn config_path() -> &'static str {
        "./config/kanagawa_2025"
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.metadata().code, "kanagawa_2025");
        assert_eq!(loader.metadata().prefecture, "kanagawa");
    }

    #[test]
    fn test_embedded_matches_directory() {
        let from_dir = ConfigLoader::load(config_path()).unwrap();
        let embedded = ConfigLoader::embedded().unwrap();

        assert_eq!(from_dir.metadata().code, embedded.metadata().code);
        assert_eq!(
            from_dir.standard_remuneration_bands(),
            embedded.standard_remuneration_bands()
        );
        assert_eq!(
            from_dir.withholding_table().bands,
            embedded.withholding_table().bands
        );
    }

    #[test]
    fn test_health_rates_by_age_category() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        assert_eq!(loader.health_rate(AgeCategory::Under40), dec("0.0992"));
        assert_eq!(loader.health_rate(AgeCategory::From40To64), dec("0.1151"));
        assert_eq!(loader.health_rate(AgeCategory::From65), dec("0.0992"));
        assert_eq!(loader.config().rates().health.nursing_care(), dec("0.0159"));
    }

    #[test]
    fn test_pension_rates() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let pension = loader.pension_rates();

        assert_eq!(pension.rate, dec("0.183"));
        assert_eq!(pension.floor, dec("88000"));
        assert_eq!(pension.cap, dec("650000"));
    }

    #[test]
    fn test_employment_rates_by_type() {
        let loader = ConfigLoader::load(config_path()).unwrap();

        assert_eq!(loader.employment_rate(EmploymentType::General), dec("0.0055"));
        assert_eq!(
            loader.employment_rate(EmploymentType::Agriculture),
            dec("0.0065")
        );
        assert_eq!(
            loader.employment_rate(EmploymentType::Construction),
            dec("0.0065")
        );
    }

    #[test]
    fn test_standard_remuneration_has_fifty_grades() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let bands = loader.standard_remuneration_bands();

        assert_eq!(bands.len(), 50);
        assert_eq!(bands[0].standard, dec("58000"));
        assert_eq!(bands[49].standard, dec("1390000"));
        assert_eq!(bands[49].range_max, None);
        assert_eq!(bands[3].pension_grade, Some(1));
        assert_eq!(bands[34].pension_grade, Some(32));
    }

    #[test]
    fn test_withholding_table_shape() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        let table = loader.withholding_table();

        assert_eq!(table.max_tabulated_dependents, 7);
        assert_eq!(table.per_extra_dependent_deduction, dec("1610"));
        assert!(table.bands.iter().all(|b| b.tax_by_dependents.len() == 8));
        assert!(table.bands.last().unwrap().excess_rate.is_some());
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("scheme.yaml"));
            }
            other => panic!("Expected ConfigNotFound error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_parse_error_reports_origin() {
        let result = ConfigLoader::parse_yaml::<RatesConfig>("health: [", "inline.yaml");

        match result {
            Err(EngineError::ConfigParseError { path, .. }) => assert_eq!(path, "inline.yaml"),
            other => panic!("Expected ConfigParseError, got {:?}", other.err()),
        }
    }
}
