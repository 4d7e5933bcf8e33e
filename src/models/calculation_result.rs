//! Calculation result models for the deduction engine.
//!
//! This module contains the [`CalculationResult`] type and its associated
//! structures that capture all outputs from a deduction calculation,
//! including per-category contributions, income tax, totals, and audit traces.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AgeCategory, CalculationOptions, EmploymentType};

/// Warning code for a net payment below zero.
pub const WARNING_NEGATIVE_NET_PAYMENT: &str = "NEGATIVE_NET_PAYMENT";
/// Warning code for income tax computed from pre-deduction income.
pub const WARNING_TAX_APPROXIMATED: &str = "TAX_APPROXIMATED";
/// Warning code for a disabled category that could not be computed.
pub const WARNING_CATEGORY_UNAVAILABLE: &str = "CATEGORY_UNAVAILABLE";

/// One contribution category: the total premium, the employee's share and
/// the rate it was computed from.
///
/// # Example
///
/// ```
/// use deduction_engine::models::ContributionLine;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let line = ContributionLine {
///     total: Decimal::from_str("29760").unwrap(),
///     employee: Decimal::from_str("14880").unwrap(),
///     rate: Decimal::from_str("0.0992").unwrap(),
/// };
/// assert_eq!(line.employer(), Decimal::from_str("14880").unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionLine {
    /// The total premium before splitting.
    pub total: Decimal,
    /// The amount deducted from the employee's salary.
    pub employee: Decimal,
    /// The rate applied to the base.
    pub rate: Decimal,
}

impl ContributionLine {
    /// A line with every amount set to zero.
    pub fn zero() -> Self {
        Self {
            total: Decimal::ZERO,
            employee: Decimal::ZERO,
            rate: Decimal::ZERO,
        }
    }

    /// The part of the total not paid by the employee.
    pub fn employer(&self) -> Decimal {
        (self.total - self.employee).max(Decimal::ZERO)
    }
}

/// Withholding income tax details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxLine {
    /// The tax withheld after the dependent adjustment, never negative.
    pub amount: Decimal,
    /// The income the tax was looked up for.
    pub taxable_income: Decimal,
    /// The table amount before the extra-dependent deduction.
    pub table_amount: Decimal,
    /// The deduction for dependents beyond the tabulated columns.
    pub dependent_deduction: Decimal,
    /// True when the amount was computed from pre-deduction income because
    /// the post-deduction lookup failed.
    pub approximated: bool,
}

impl IncomeTaxLine {
    /// A line with every amount set to zero.
    pub fn zero() -> Self {
        Self {
            amount: Decimal::ZERO,
            taxable_income: Decimal::ZERO,
            table_amount: Decimal::ZERO,
            dependent_deduction: Decimal::ZERO,
            approximated: false,
        }
    }
}

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The table or statute the rule comes from.
    pub basis: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate conditions that don't prevent calculation
/// but should be surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

impl AuditWarning {
    /// Creates a warning.
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: severity.into(),
        }
    }
}

/// The complete audit trace for a calculation.
///
/// Records every decision made during the calculation process.
///
/// # Example
///
/// ```
/// use deduction_engine::models::AuditTrace;
///
/// let trace = AuditTrace {
///     steps: vec![],
///     warnings: vec![],
///     duration_us: 1234,
/// };
/// assert!(!trace.has_warning("NEGATIVE_NET_PAYMENT"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings generated during calculation.
    pub warnings: Vec<AuditWarning>,
    /// The total calculation duration in microseconds.
    pub duration_us: u64,
}

impl AuditTrace {
    /// Returns true if a warning with the given code was recorded.
    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }
}

/// The complete result of a deduction calculation.
///
/// Every category is always present. Disabled categories keep their computed
/// amounts but are left out of `total_deduction`, so the result describes
/// what each deduction would have been.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// Unique identifier for this calculation.
    pub calculation_id: Uuid,
    /// When the calculation was performed.
    pub calculated_at: DateTime<Utc>,
    /// The rate scheme the amounts were computed with.
    pub scheme_code: String,
    /// The monthly gross salary the calculation was run for.
    pub salary_input: Decimal,
    /// The age bracket derived from the input age.
    pub age_category: AgeCategory,
    /// The employment type used for employment insurance.
    pub employment_type: EmploymentType,
    /// The dependent count used for withholding tax.
    pub dependents: u32,
    /// Standard monthly remuneration for health insurance.
    pub standard_remuneration: Decimal,
    /// Standard monthly remuneration for the welfare pension.
    pub standard_remuneration_pension: Decimal,
    /// Health insurance, including nursing care when applicable.
    pub health_insurance: ContributionLine,
    /// The nursing care portion already included in `health_insurance`.
    pub nursing_care_insurance: ContributionLine,
    /// Welfare pension insurance.
    pub pension_insurance: ContributionLine,
    /// Employment insurance. The total equals the employee share.
    pub employment_insurance: ContributionLine,
    /// Withholding income tax.
    pub income_tax: IncomeTaxLine,
    /// Sum of the enabled categories' employee amounts.
    pub total_deduction: Decimal,
    /// Salary minus enabled social and employment insurance.
    pub net_payment_before_tax: Decimal,
    /// Salary minus `total_deduction`. May be negative.
    pub net_payment: Decimal,
    /// The options the result was computed with.
    pub options: CalculationOptions,
    /// Complete audit trace of calculation decisions.
    pub audit_trace: AuditTrace,
}

impl CalculationResult {
    /// Returns true when deductions exceed the salary.
    pub fn has_negative_net_payment(&self) -> bool {
        self.net_payment < Decimal::ZERO
    }

    /// Employee health and pension contributions combined.
    pub fn social_insurance_employee(&self) -> Decimal {
        self.health_insurance.employee + self.pension_insurance.employee
    }
}
