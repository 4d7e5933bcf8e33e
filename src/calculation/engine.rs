//! Synchronous deduction calculation against a loaded rate scheme.

use std::time::Instant;
use uuid::Uuid;

use crate::config::ConfigLoader;
use crate::error::EngineResult;
use crate::models::{AgeCategory, CalculationResult, DeductionInput};

use super::aggregate::{AggregationContext, DeductionLines, aggregate, taxable_income};
use super::contribution::{
    calculate_employment_insurance, calculate_health_insurance, calculate_pension_insurance,
};
use super::standard_remuneration::resolve_standard_remuneration;
use super::withholding_tax::resolve_withholding_tax;

/// Calculates all deductions for one input using the local tables.
///
/// Standard remuneration is resolved first, then the three contributions,
/// then withholding tax on the income left after the enabled contributions,
/// and finally the totals.
///
/// # Example
///
/// ```
/// use deduction_engine::calculation::calculate_deductions;
/// use deduction_engine::config::ConfigLoader;
/// use deduction_engine::models::DeductionInput;
/// use rust_decimal::Decimal;
///
/// let config = ConfigLoader::embedded().unwrap();
/// let input = DeductionInput::new(Decimal::from(300_000), 35);
/// let result = calculate_deductions(&input, &config).unwrap();
/// assert_eq!(result.net_payment, Decimal::from(249_270));
/// ```
pub fn calculate_deductions(
    input: &DeductionInput,
    config: &ConfigLoader,
) -> EngineResult<CalculationResult> {
    let started = Instant::now();
    input.validate()?;

    let age_category = AgeCategory::from_age(input.age);

    let standard = resolve_standard_remuneration(
        input.salary,
        config.standard_remuneration_bands(),
        config.pension_rates(),
        1,
    )?;
    let health = calculate_health_insurance(
        standard.health_standard,
        age_category,
        &config.config().rates().health,
        2,
    )?;
    let pension = calculate_pension_insurance(standard.pension_standard, config.pension_rates(), 3)?;
    let employment = calculate_employment_insurance(
        input.salary,
        input.employment_type,
        config.employment_rate(input.employment_type),
        4,
    )?;

    let taxable = taxable_income(
        input.salary,
        &health.health,
        &pension.line,
        &employment.line,
        &input.options,
    );
    let tax = resolve_withholding_tax(taxable, input.dependents, config.withholding_table(), 5)?;

    let steps = vec![
        standard.audit_step,
        health.audit_step,
        pension.audit_step,
        employment.audit_step,
        tax.audit_step,
    ];

    Ok(aggregate(
        AggregationContext {
            calculation_id: Uuid::new_v4(),
            scheme_code: config.metadata().code.clone(),
            input: input.clone(),
            standard_remuneration: standard.health_standard,
            standard_remuneration_pension: standard.pension_standard,
        },
        DeductionLines {
            health: health.health,
            nursing_care: health.nursing_care,
            pension: pension.line,
            employment: employment.line,
            income_tax: tax.line,
        },
        steps,
        Vec::new(),
        started,
    ))
}
