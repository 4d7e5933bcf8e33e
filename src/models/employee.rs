//! Employment type and calculation option models.
//!
//! This module defines the employment categories used to select the
//! employment insurance rate, and the toggles that gate which deduction
//! categories count toward the totals.

use serde::{Deserialize, Serialize};

/// Represents the kind of business the employee works in.
///
/// Employment insurance rates differ by industry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    /// General business.
    #[default]
    General,
    /// Agriculture, forestry, fisheries and sake brewing.
    Agriculture,
    /// Construction.
    Construction,
}

impl EmploymentType {
    /// Returns the wire name of the employment type.
    pub fn as_str(self) -> &'static str {
        match self {
            EmploymentType::General => "general",
            EmploymentType::Agriculture => "agriculture",
            EmploymentType::Construction => "construction",
        }
    }
}

/// Toggles that decide which categories are included in the totals.
///
/// A toggle never changes the computed amount of its category, only whether
/// the amount is counted in `total_deduction`.
///
/// # Example
///
/// ```
/// use deduction_engine::models::CalculationOptions;
///
/// let options = CalculationOptions::default();
/// assert!(options.enable_social && options.enable_employment && options.enable_tax);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationOptions {
    /// Include health, nursing care and pension insurance.
    pub enable_social: bool,
    /// Include employment insurance.
    pub enable_employment: bool,
    /// Include withholding income tax.
    pub enable_tax: bool,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            enable_social: true,
            enable_employment: true,
            enable_tax: true,
        }
    }
}
