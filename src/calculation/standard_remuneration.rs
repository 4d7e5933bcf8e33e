//! Standard monthly remuneration lookup.
//!
//! Health insurance and the welfare pension are not charged on the raw
//! salary but on the "standard monthly remuneration" of the grade the salary
//! falls into. The pension scale is narrower than the health scale, so the
//! pension standard is the health standard clamped to the pension floor and
//! cap.

use rust_decimal::Decimal;

use crate::config::{PensionRates, StandardRemunerationBand};
use crate::error::{EngineError, EngineResult};
use crate::models::AuditStep;

use super::band_lookup::{BandMatch, find_band};

/// Source name reported when the grade table cannot resolve a salary.
pub const STANDARD_REMUNERATION_SOURCE: &str = "standard_remuneration";

/// The result of resolving a salary to its standard remunerations.
#[derive(Debug, Clone)]
pub struct StandardRemunerationResult {
    /// Standard monthly remuneration for health insurance.
    pub health_standard: Decimal,
    /// Standard monthly remuneration for the welfare pension.
    pub pension_standard: Decimal,
    /// The health insurance grade of the matched band.
    pub grade: u32,
    /// The pension grade the pension standard corresponds to, if known.
    pub pension_grade: Option<u32>,
    /// Whether the salary fell inside the table or was clamped to an end.
    pub band_match: BandMatch,
    /// The audit step recording this lookup.
    pub audit_step: AuditStep,
}

/// Resolves a monthly salary to its health and pension standard
/// remunerations.
///
/// Salaries below the table use the lowest grade and salaries above it use
/// the highest. The pension floor and cap are applied after the health
/// lookup, including when the health standard itself was clamped.
///
/// # Errors
///
/// Returns `LookupFailure` if no band covers the salary, which cannot happen
/// for a table that passed validation.
///
/// # Example
///
/// ```
/// use deduction_engine::calculation::resolve_standard_remuneration;
/// use deduction_engine::config::ConfigLoader;
/// use rust_decimal::Decimal;
///
/// let config = ConfigLoader::embedded().unwrap();
/// let result = resolve_standard_remuneration(
///     Decimal::from(300_000),
///     config.standard_remuneration_bands(),
///     config.pension_rates(),
///     1,
/// )
/// .unwrap();
/// assert_eq!(result.health_standard, Decimal::from(300_000));
/// assert_eq!(result.grade, 22);
/// ```
pub fn resolve_standard_remuneration(
    salary: Decimal,
    bands: &[StandardRemunerationBand],
    pension: &PensionRates,
    step_number: u32,
) -> EngineResult<StandardRemunerationResult> {
    let (band, band_match) = find_band(bands, salary).ok_or_else(|| {
        EngineError::lookup_failure(
            STANDARD_REMUNERATION_SOURCE,
            format!("no grade covers a salary of {}", salary),
        )
    })?;

    let health_standard = band.standard;
    let pension_standard = health_standard.clamp(pension.floor, pension.cap);
    let pension_grade = bands
        .iter()
        .find(|b| b.standard == pension_standard)
        .and_then(|b| b.pension_grade);

    let reasoning = match band_match {
        BandMatch::Interior => format!(
            "Salary {} falls in grade {} [{}, {}): standard remuneration {}",
            salary,
            band.grade,
            band.range_min,
            band
                .range_max
                .map(|m| m.to_string())
                .unwrap_or_else(|| "open".to_string()),
            health_standard
        ),
        BandMatch::ClampedLow => format!(
            "Salary {} is below the table; using the lowest grade {} ({})",
            salary, band.grade, health_standard
        ),
        BandMatch::ClampedHigh => format!(
            "Salary {} is above the table; using the highest grade {} ({})",
            salary, band.grade, health_standard
        ),
    };
    let reasoning = if pension_standard == health_standard {
        reasoning
    } else {
        format!(
            "{}; pension standard clamped to {} (floor {}, cap {})",
            reasoning, pension_standard, pension.floor, pension.cap
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "standard_remuneration_lookup".to_string(),
        rule_name: "Standard Monthly Remuneration".to_string(),
        basis: "Health Insurance Act art. 40; Welfare Pension Insurance Act art. 20".to_string(),
        input: serde_json::json!({
            "salary": salary.to_string(),
            "pension_floor": pension.floor.to_string(),
            "pension_cap": pension.cap.to_string()
        }),
        output: serde_json::json!({
            "grade": band.grade,
            "pension_grade": pension_grade,
            "health_standard": health_standard.to_string(),
            "pension_standard": pension_standard.to_string(),
            "band_match": band_match
        }),
        reasoning,
    };

    Ok(StandardRemunerationResult {
        health_standard,
        pension_standard,
        grade: band.grade,
        pension_grade,
        band_match,
        audit_step,
    })
}
