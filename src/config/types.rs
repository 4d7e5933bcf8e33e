//! Configuration types for the rate scheme.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML files of a scheme directory.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::calculation::{RangeBand, validate_bands};
use crate::error::{EngineError, EngineResult};
use crate::models::{AgeCategory, EmploymentType};

/// Metadata about the rate scheme.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemeMetadata {
    /// Short identifier (e.g., "kanagawa_2025").
    pub code: String,
    /// The human-readable name of the scheme.
    pub name: String,
    /// The prefecture whose health insurance rates apply.
    pub prefecture: String,
    /// The date from which the health insurance rates apply.
    pub effective_date: NaiveDate,
    /// URL to the published rate table.
    pub source_url: String,
}

/// Health insurance total rates (employer and employee combined).
#[derive(Debug, Clone, Deserialize)]
pub struct HealthRates {
    /// Rate for insured persons without nursing care (under 40, 65 and over).
    pub without_nursing_care: Decimal,
    /// Rate for insured persons aged 40 to 64, nursing care included.
    pub with_nursing_care: Decimal,
}

impl HealthRates {
    /// Selects the total rate for an age category.
    pub fn for_age(&self, age_category: AgeCategory) -> Decimal {
        if age_category.includes_nursing_care() {
            self.with_nursing_care
        } else {
            self.without_nursing_care
        }
    }

    /// The nursing care rate on its own.
    pub fn nursing_care(&self) -> Decimal {
        self.with_nursing_care - self.without_nursing_care
    }
}

/// Welfare pension rate and the bounds of its standard remuneration.
#[derive(Debug, Clone, Deserialize)]
pub struct PensionRates {
    /// Total pension rate (employer and employee combined).
    pub rate: Decimal,
    /// Lowest pension standard remuneration.
    pub floor: Decimal,
    /// Highest pension standard remuneration.
    pub cap: Decimal,
}

/// Employment insurance employee rates by industry.
#[derive(Debug, Clone, Deserialize)]
pub struct EmploymentRates {
    /// The date from which these rates apply.
    pub effective_date: NaiveDate,
    /// Rate for general business.
    pub general: Decimal,
    /// Rate for agriculture, forestry, fisheries and sake brewing.
    pub agriculture: Decimal,
    /// Rate for construction.
    pub construction: Decimal,
}

impl EmploymentRates {
    /// Selects the employee rate for an employment type.
    pub fn for_type(&self, employment_type: EmploymentType) -> Decimal {
        match employment_type {
            EmploymentType::General => self.general,
            EmploymentType::Agriculture => self.agriculture,
            EmploymentType::Construction => self.construction,
        }
    }
}

/// Rate configuration from rates.yaml.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Health insurance rates.
    pub health: HealthRates,
    /// Welfare pension rates.
    pub pension: PensionRates,
    /// Employment insurance rates.
    pub employment: EmploymentRates,
}

/// One grade of the standard monthly remuneration table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StandardRemunerationBand {
    /// Health insurance grade.
    pub grade: u32,
    /// Pension grade, when this health grade lies inside the pension scale.
    #[serde(default)]
    pub pension_grade: Option<u32>,
    /// The standard monthly remuneration for this grade.
    pub standard: Decimal,
    /// Lowest salary in the grade (inclusive).
    pub range_min: Decimal,
    /// Highest salary in the grade (exclusive). `None` for the open top grade.
    #[serde(default)]
    pub range_max: Option<Decimal>,
}

impl RangeBand for StandardRemunerationBand {
    fn range_min(&self) -> Decimal {
        self.range_min
    }

    fn range_max(&self) -> Option<Decimal> {
        self.range_max
    }
}

/// Standard remuneration file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardRemunerationConfig {
    /// Grades ordered by salary.
    pub bands: Vec<StandardRemunerationBand>,
}

/// One band of the monthly withholding tax table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WithholdingBand {
    /// Lowest taxable income in the band (inclusive).
    pub range_min: Decimal,
    /// Highest taxable income in the band (exclusive).
    #[serde(default)]
    pub range_max: Option<Decimal>,
    /// Tax for 0, 1, ... tabulated dependents.
    pub tax_by_dependents: Vec<Decimal>,
    /// Rate applied to income above `range_min`, added to the column amount.
    #[serde(default)]
    pub excess_rate: Option<Decimal>,
}

impl RangeBand for WithholdingBand {
    fn range_min(&self) -> Decimal {
        self.range_min
    }

    fn range_max(&self) -> Option<Decimal> {
        self.range_max
    }
}

/// Withholding table file structure.
#[derive(Debug, Clone, Deserialize)]
pub struct WithholdingTable {
    /// The highest dependent count with its own column.
    pub max_tabulated_dependents: u32,
    /// Deduction for each dependent beyond `max_tabulated_dependents`.
    pub per_extra_dependent_deduction: Decimal,
    /// Bands ordered by taxable income.
    pub bands: Vec<WithholdingBand>,
}

/// The complete rate scheme loaded from YAML files.
///
/// Band tables are sorted and validated on construction so that every
/// lookup matches exactly one band.
#[derive(Debug, Clone)]
pub struct SchemeConfig {
    metadata: SchemeMetadata,
    rates: RatesConfig,
    standard_remuneration: Vec<StandardRemunerationBand>,
    withholding: WithholdingTable,
}

impl SchemeConfig {
    /// Creates a new SchemeConfig from its component parts.
    ///
    /// Returns `ConfigInvalid` if a table has gaps or overlaps, or a rate is
    /// out of range.
    pub fn new(
        metadata: SchemeMetadata,
        rates: RatesConfig,
        standard_remuneration: Vec<StandardRemunerationBand>,
        withholding: WithholdingTable,
    ) -> EngineResult<Self> {
        let mut standard_remuneration = standard_remuneration;
        standard_remuneration.sort_by(|a, b| a.range_min.cmp(&b.range_min));
        let mut withholding = withholding;
        withholding
            .bands
            .sort_by(|a, b| a.range_min.cmp(&b.range_min));

        validate_bands("standard_remuneration", &standard_remuneration)?;
        validate_bands("withholding", &withholding.bands)?;
        Self::validate_rates(&rates)?;
        Self::validate_withholding(&withholding)?;

        Ok(Self {
            metadata,
            rates,
            standard_remuneration,
            withholding,
        })
    }

    fn validate_rates(rates: &RatesConfig) -> EngineResult<()> {
        let all = [
            ("health.without_nursing_care", rates.health.without_nursing_care),
            ("health.with_nursing_care", rates.health.with_nursing_care),
            ("pension.rate", rates.pension.rate),
            ("pension.floor", rates.pension.floor),
            ("employment.general", rates.employment.general),
            ("employment.agriculture", rates.employment.agriculture),
            ("employment.construction", rates.employment.construction),
        ];
        if let Some((name, value)) = all.iter().find(|(_, v)| *v < Decimal::ZERO) {
            return Err(EngineError::ConfigInvalid {
                message: format!("{} must not be negative, got {}", name, value),
            });
        }
        if rates.health.with_nursing_care < rates.health.without_nursing_care {
            return Err(EngineError::ConfigInvalid {
                message: "health.with_nursing_care is lower than health.without_nursing_care"
                    .to_string(),
            });
        }
        if rates.pension.cap < rates.pension.floor {
            return Err(EngineError::ConfigInvalid {
                message: format!(
                    "pension.cap {} is lower than pension.floor {}",
                    rates.pension.cap, rates.pension.floor
                ),
            });
        }
        Ok(())
    }

    fn validate_withholding(table: &WithholdingTable) -> EngineResult<()> {
        let columns = table.max_tabulated_dependents as usize + 1;
        for band in &table.bands {
            if band.tax_by_dependents.len() != columns {
                return Err(EngineError::ConfigInvalid {
                    message: format!(
                        "withholding band starting at {} has {} columns, expected {}",
                        band.range_min,
                        band.tax_by_dependents.len(),
                        columns
                    ),
                });
            }
            if band.tax_by_dependents.iter().any(|t| *t < Decimal::ZERO) {
                return Err(EngineError::ConfigInvalid {
                    message: format!(
                        "withholding band starting at {} has a negative amount",
                        band.range_min
                    ),
                });
            }
        }
        if table.per_extra_dependent_deduction < Decimal::ZERO {
            return Err(EngineError::ConfigInvalid {
                message: "per_extra_dependent_deduction must not be negative".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the scheme metadata.
    pub fn metadata(&self) -> &SchemeMetadata {
        &self.metadata
    }

    /// Returns the rate configuration.
    pub fn rates(&self) -> &RatesConfig {
        &self.rates
    }

    /// Returns the standard remuneration grades, ordered by salary.
    pub fn standard_remuneration(&self) -> &[StandardRemunerationBand] {
        &self.standard_remuneration
    }

    /// Returns the withholding tax table.
    pub fn withholding(&self) -> &WithholdingTable {
        &self.withholding
    }
}
