//! Core data models for the deduction engine.
//!
//! This module contains all the domain models used throughout the engine.

mod age_category;
mod calculation_result;
mod employee;
mod input;

pub use age_category::{AgeCategory, NURSING_CARE_END_AGE, NURSING_CARE_START_AGE};
pub use calculation_result::{
    AuditStep, AuditTrace, AuditWarning, CalculationResult, ContributionLine, IncomeTaxLine,
    WARNING_CATEGORY_UNAVAILABLE, WARNING_NEGATIVE_NET_PAYMENT, WARNING_TAX_APPROXIMATED,
};
pub use employee::{CalculationOptions, EmploymentType};
pub use input::{CalculatorInput, DeductionInput, MAX_AGE};
