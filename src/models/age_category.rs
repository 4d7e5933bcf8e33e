//! Age category model.
//!
//! The age category is always derived from the employee's age and is never
//! stored independently. It drives health-insurance rate selection.

use serde::{Deserialize, Serialize};

/// The age at which an employee becomes a secondary insured person for
/// long-term (nursing) care insurance.
pub const NURSING_CARE_START_AGE: u32 = 40;

/// The age from which nursing care is collected from the public pension
/// instead of from salary.
pub const NURSING_CARE_END_AGE: u32 = 65;

/// Represents the age bracket that determines which rates apply.
///
/// # Example
///
/// ```
/// use deduction_engine::models::AgeCategory;
///
/// assert_eq!(AgeCategory::from_age(35), AgeCategory::Under40);
/// assert_eq!(AgeCategory::from_age(40), AgeCategory::From40To64);
/// assert_eq!(AgeCategory::from_age(65), AgeCategory::From65);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeCategory {
    /// Younger than 40: no nursing care contribution.
    #[serde(rename = "under40")]
    Under40,
    /// 40 to 64 inclusive: nursing care is deducted from salary.
    #[serde(rename = "40to64")]
    From40To64,
    /// 65 and over: nursing care is collected from the public pension.
    #[serde(rename = "65plus", alias = "over64")]
    From65,
}

impl AgeCategory {
    /// Derives the age category from an age in whole years.
    pub fn from_age(age: u32) -> Self {
        if age < NURSING_CARE_START_AGE {
            AgeCategory::Under40
        } else if age < NURSING_CARE_END_AGE {
            AgeCategory::From40To64
        } else {
            AgeCategory::From65
        }
    }

    /// Returns true when the nursing care rate is added to health insurance.
    pub fn includes_nursing_care(self) -> bool {
        self == AgeCategory::From40To64
    }

    /// Returns the wire name of the category.
    pub fn as_str(self) -> &'static str {
        match self {
            AgeCategory::Under40 => "under40",
            AgeCategory::From40To64 => "40to64",
            AgeCategory::From65 => "65plus",
        }
    }
}
