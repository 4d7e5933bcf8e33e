//! Aggregation of category amounts into totals and the final result.
//!
//! Options decide which categories count toward the totals. They never
//! change a category's own amount: a disabled category is still reported so
//! the result shows what it would have been.

use chrono::Utc;
use rust_decimal::Decimal;
use std::time::Instant;
use uuid::Uuid;

use crate::models::{
    AgeCategory, AuditStep, AuditTrace, AuditWarning, CalculationOptions, CalculationResult,
    ContributionLine, DeductionInput, IncomeTaxLine, WARNING_NEGATIVE_NET_PAYMENT,
};

/// The per-category amounts of one calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeductionLines {
    /// Health insurance, nursing care included when applicable.
    pub health: ContributionLine,
    /// The nursing care portion of `health`.
    pub nursing_care: ContributionLine,
    /// Welfare pension.
    pub pension: ContributionLine,
    /// Employment insurance.
    pub employment: ContributionLine,
    /// Withholding income tax.
    pub income_tax: IncomeTaxLine,
}

/// Everything [`aggregate`] needs besides the category amounts.
#[derive(Debug, Clone)]
pub struct AggregationContext {
    /// Identifier assigned to the calculation.
    pub calculation_id: Uuid,
    /// Code of the rate scheme used.
    pub scheme_code: String,
    /// The validated input.
    pub input: DeductionInput,
    /// Standard remuneration for health insurance.
    pub standard_remuneration: Decimal,
    /// Standard remuneration for the welfare pension.
    pub standard_remuneration_pension: Decimal,
}

/// Salary minus the employee share of each enabled social and employment
/// category. This is the income withholding tax is looked up for.
pub fn taxable_income(
    salary: Decimal,
    health: &ContributionLine,
    pension: &ContributionLine,
    employment: &ContributionLine,
    options: &CalculationOptions,
) -> Decimal {
    let social = if options.enable_social {
        health.employee + pension.employee
    } else {
        Decimal::ZERO
    };
    let employment = if options.enable_employment {
        employment.employee
    } else {
        Decimal::ZERO
    };
    salary - social - employment
}

/// Sums the enabled categories and assembles the final result.
///
/// `steps` and `warnings` are the audit records gathered so far; the
/// aggregation step is appended after them. A net payment below zero is kept
/// as is and flagged with a `NEGATIVE_NET_PAYMENT` warning.
pub fn aggregate(
    context: AggregationContext,
    lines: DeductionLines,
    mut steps: Vec<AuditStep>,
    mut warnings: Vec<AuditWarning>,
    started: Instant,
) -> CalculationResult {
    let input = context.input;
    let options = input.options;

    let net_payment_before_tax = taxable_income(
        input.salary,
        &lines.health,
        &lines.pension,
        &lines.employment,
        &options,
    );
    let tax = if options.enable_tax {
        lines.income_tax.amount.max(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };
    let total_deduction = (input.salary - net_payment_before_tax) + tax;
    let net_payment = input.salary - total_deduction;

    if net_payment < Decimal::ZERO {
        warnings.push(AuditWarning::new(
            WARNING_NEGATIVE_NET_PAYMENT,
            format!(
                "Deductions of {} exceed the salary of {}",
                total_deduction, input.salary
            ),
            "high",
        ));
    }

    steps.push(AuditStep {
        step_number: steps.len() as u32 + 1,
        rule_id: "aggregate_deductions".to_string(),
        rule_name: "Deduction Totals".to_string(),
        basis: "Enabled categories".to_string(),
        input: serde_json::json!({
            "salary": input.salary.to_string(),
            "enable_social": options.enable_social,
            "enable_employment": options.enable_employment,
            "enable_tax": options.enable_tax,
            "health_employee": lines.health.employee.to_string(),
            "pension_employee": lines.pension.employee.to_string(),
            "employment_employee": lines.employment.employee.to_string(),
            "income_tax": lines.income_tax.amount.to_string()
        }),
        output: serde_json::json!({
            "total_deduction": total_deduction.to_string(),
            "net_payment_before_tax": net_payment_before_tax.to_string(),
            "net_payment": net_payment.to_string()
        }),
        reasoning: format!(
            "Total deduction {} from salary {} leaves {}",
            total_deduction, input.salary, net_payment
        ),
    });

    CalculationResult {
        calculation_id: context.calculation_id,
        calculated_at: Utc::now(),
        scheme_code: context.scheme_code,
        salary_input: input.salary,
        age_category: AgeCategory::from_age(input.age),
        employment_type: input.employment_type,
        dependents: input.dependents,
        standard_remuneration: context.standard_remuneration,
        standard_remuneration_pension: context.standard_remuneration_pension,
        health_insurance: lines.health,
        nursing_care_insurance: lines.nursing_care,
        pension_insurance: lines.pension,
        employment_insurance: lines.employment,
        income_tax: lines.income_tax,
        total_deduction,
        net_payment_before_tax,
        net_payment,
        options,
        audit_trace: AuditTrace {
            steps,
            warnings,
            duration_us: started.elapsed().as_micros() as u64,
        },
    }
}
