//! Social and employment insurance contributions.
//!
//! Health insurance (with nursing care from 40 to 64) and the welfare
//! pension are charged on the standard monthly remuneration and shared
//! equally between employer and employee. Employment insurance is charged on
//! the raw salary and its rate is already the employee's share.
//!
//! ## Rounding
//!
//! The employee share is rounded with [`round_half_down`]: a fraction of 50
//! sen or less is dropped, anything above rounds up.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{HealthRates, PensionRates};
use crate::error::{EngineError, EngineResult};
use crate::models::{AgeCategory, AuditStep, ContributionLine, EmploymentType};

use super::rounding::round_half_down;

/// The premium on a base amount and the employee's half of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionSplit {
    /// `standard * total_rate`, unrounded.
    pub total: Decimal,
    /// `round_half_down(total / 2)`.
    pub employee: Decimal,
}

/// Splits a contribution equally between employer and employee.
///
/// # Errors
///
/// Returns `InvalidInput` if either argument is negative.
///
/// # Example
///
/// ```
/// use deduction_engine::calculation::split_contribution;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let split = split_contribution(
///     Decimal::from(110_000),
///     Decimal::from_str("0.1151").unwrap(),
/// )
/// .unwrap();
/// assert_eq!(split.total, Decimal::from(12_661));
/// // 6330.5 is rounded down.
/// assert_eq!(split.employee, Decimal::from(6_330));
/// ```
pub fn split_contribution(standard: Decimal, total_rate: Decimal) -> EngineResult<ContributionSplit> {
    if standard < Decimal::ZERO {
        return Err(EngineError::invalid_input(
            "standard",
            format!("must not be negative, got {}", standard),
        ));
    }
    if total_rate < Decimal::ZERO {
        return Err(EngineError::invalid_input(
            "total_rate",
            format!("must not be negative, got {}", total_rate),
        ));
    }

    let total = standard * total_rate;
    let employee = round_half_down(total / Decimal::TWO);

    Ok(ContributionSplit { total, employee })
}

/// Health insurance contribution with its nursing care portion.
#[derive(Debug, Clone)]
pub struct HealthContributionResult {
    /// Health insurance, nursing care included when applicable.
    pub health: ContributionLine,
    /// The nursing care portion of `health`. Zero outside 40 to 64.
    pub nursing_care: ContributionLine,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates the health insurance contribution for an age category.
///
/// From 40 to 64 the nursing care inclusive rate applies. The nursing care
/// line reports the part of the employee share attributable to nursing care,
/// i.e. the difference from the share at the rate without nursing care.
pub fn calculate_health_insurance(
    standard: Decimal,
    age_category: AgeCategory,
    rates: &HealthRates,
    step_number: u32,
) -> EngineResult<HealthContributionResult> {
    let rate = rates.for_age(age_category);
    let split = split_contribution(standard, rate)?;

    let nursing_care = if age_category.includes_nursing_care() {
        let base = split_contribution(standard, rates.without_nursing_care)?;
        ContributionLine {
            total: split.total - base.total,
            employee: split.employee - base.employee,
            rate: rates.nursing_care(),
        }
    } else {
        ContributionLine::zero()
    };

    let reasoning = if age_category.includes_nursing_care() {
        format!(
            "Age category {} includes nursing care: {} x {} = {}, employee half {} ({} of it nursing care)",
            age_category.as_str(),
            standard,
            rate,
            split.total,
            split.employee,
            nursing_care.employee
        )
    } else {
        format!(
            "Age category {} excludes nursing care: {} x {} = {}, employee half {}",
            age_category.as_str(),
            standard,
            rate,
            split.total,
            split.employee
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "health_insurance".to_string(),
        rule_name: "Health Insurance".to_string(),
        basis: "Health Insurance Act art. 156, 161; Long-Term Care Insurance Act art. 9".to_string(),
        input: serde_json::json!({
            "standard_remuneration": standard.to_string(),
            "age_category": age_category.as_str(),
            "rate": rate.to_string()
        }),
        output: serde_json::json!({
            "total": split.total.to_string(),
            "employee": split.employee.to_string(),
            "nursing_care_employee": nursing_care.employee.to_string()
        }),
        reasoning,
    };

    Ok(HealthContributionResult {
        health: ContributionLine {
            total: split.total,
            employee: split.employee,
            rate,
        },
        nursing_care,
        audit_step,
    })
}

/// A single contribution line and its audit step.
#[derive(Debug, Clone)]
pub struct ContributionResult {
    /// The computed contribution.
    pub line: ContributionLine,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates the welfare pension contribution on the pension standard
/// remuneration.
pub fn calculate_pension_insurance(
    pension_standard: Decimal,
    rates: &PensionRates,
    step_number: u32,
) -> EngineResult<ContributionResult> {
    let split = split_contribution(pension_standard, rates.rate)?;

    let audit_step = AuditStep {
        step_number,
        rule_id: "pension_insurance".to_string(),
        rule_name: "Welfare Pension Insurance".to_string(),
        basis: "Welfare Pension Insurance Act art. 81, 82".to_string(),
        input: serde_json::json!({
            "pension_standard": pension_standard.to_string(),
            "rate": rates.rate.to_string()
        }),
        output: serde_json::json!({
            "total": split.total.to_string(),
            "employee": split.employee.to_string()
        }),
        reasoning: format!(
            "{} x {} = {}, employee half {}",
            pension_standard, rates.rate, split.total, split.employee
        ),
    };

    Ok(ContributionResult {
        line: ContributionLine {
            total: split.total,
            employee: split.employee,
            rate: rates.rate,
        },
        audit_step,
    })
}

/// Calculates employment insurance on the raw salary.
///
/// The rate is the employee's own rate, so the amount is not halved; the
/// line's total equals the employee amount.
pub fn calculate_employment_insurance(
    salary: Decimal,
    employment_type: EmploymentType,
    rate: Decimal,
    step_number: u32,
) -> EngineResult<ContributionResult> {
    if salary < Decimal::ZERO {
        return Err(EngineError::invalid_input(
            "salary",
            format!("must not be negative, got {}", salary),
        ));
    }
    if rate < Decimal::ZERO {
        return Err(EngineError::invalid_input(
            "employment_rate",
            format!("must not be negative, got {}", rate),
        ));
    }

    let employee = round_half_down(salary * rate);

    let audit_step = AuditStep {
        step_number,
        rule_id: "employment_insurance".to_string(),
        rule_name: "Employment Insurance".to_string(),
        basis: "Labour Insurance Premium Collection Act art. 12, 31".to_string(),
        input: serde_json::json!({
            "salary": salary.to_string(),
            "employment_type": employment_type.as_str(),
            "rate": rate.to_string()
        }),
        output: serde_json::json!({
            "employee": employee.to_string()
        }),
        reasoning: format!(
            "{} employment: {} x {} = {}",
            employment_type.as_str(),
            salary,
            rate,
            employee
        ),
    };

    Ok(ContributionResult {
        line: ContributionLine {
            total: employee,
            employee,
            rate,
        },
        audit_step,
    })
}
