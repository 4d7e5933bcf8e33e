//! Monthly withholding income tax.
//!
//! The tax is read from the monthly withholding table: the band containing
//! the taxable income, in the column for the number of dependents. The table
//! has columns for 0 to 7 dependents; each dependent beyond that reduces the
//! tax by a fixed amount, never below zero. The top bands add a percentage of
//! the income above the band's lower bound.

use rust_decimal::Decimal;

use crate::config::{WithholdingBand, WithholdingTable};
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, IncomeTaxLine};

use super::band_lookup::{BandMatch, find_band};

/// Source name reported when the withholding table cannot resolve an income.
pub const WITHHOLDING_SOURCE: &str = "withholding_tax";

/// The reduction for dependents beyond the tabulated columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependentAdjustment {
    /// The highest dependent count with its own column.
    pub max_tabulated_dependents: u32,
    /// Deduction per dependent beyond `max_tabulated_dependents`.
    pub per_extra_dependent: Decimal,
}

impl Default for DependentAdjustment {
    fn default() -> Self {
        Self {
            max_tabulated_dependents: 7,
            per_extra_dependent: Decimal::from(1610),
        }
    }
}

impl DependentAdjustment {
    /// Reads the adjustment from a withholding table.
    pub fn from_table(table: &WithholdingTable) -> Self {
        Self {
            max_tabulated_dependents: table.max_tabulated_dependents,
            per_extra_dependent: table.per_extra_dependent_deduction,
        }
    }

    /// The table column used for a dependent count.
    pub fn column(&self, dependents: u32) -> u32 {
        dependents.min(self.max_tabulated_dependents)
    }

    /// Applies the extra-dependent deduction to a table amount.
    ///
    /// Returns the adjusted amount, floored at zero, and the deduction.
    ///
    /// # Example
    ///
    /// ```
    /// use deduction_engine::calculation::DependentAdjustment;
    /// use rust_decimal::Decimal;
    ///
    /// let adjustment = DependentAdjustment::default();
    /// let (amount, deduction) = adjustment.apply(Decimal::from(28_120), 9);
    /// assert_eq!(deduction, Decimal::from(3_220));
    /// assert_eq!(amount, Decimal::from(24_900));
    /// ```
    pub fn apply(&self, table_amount: Decimal, dependents: u32) -> (Decimal, Decimal) {
        let extra = dependents.saturating_sub(self.max_tabulated_dependents);
        let deduction = self.per_extra_dependent * Decimal::from(extra);
        ((table_amount - deduction).max(Decimal::ZERO), deduction)
    }
}

/// Withholding tax and its audit step.
#[derive(Debug, Clone)]
pub struct WithholdingTaxResult {
    /// The tax line.
    pub line: IncomeTaxLine,
    /// The audit step recording the lookup.
    pub audit_step: AuditStep,
}

/// Resolves the monthly withholding tax for a taxable income.
///
/// Taxable income below the table (including a negative one) uses the first
/// band, whose amounts are all zero.
///
/// # Errors
///
/// Returns `LookupFailure` if no band covers the income or the band has no
/// column for the dependent count, neither of which can happen for a table
/// that passed validation.
///
/// # Example
///
/// ```
/// use deduction_engine::calculation::resolve_withholding_tax;
/// use deduction_engine::config::ConfigLoader;
/// use rust_decimal::Decimal;
///
/// let config = ConfigLoader::embedded().unwrap();
/// let result =
///     resolve_withholding_tax(Decimal::from(256_020), 0, config.withholding_table(), 5).unwrap();
/// assert_eq!(result.line.amount, Decimal::from(6_750));
/// ```
pub fn resolve_withholding_tax(
    taxable_income: Decimal,
    dependents: u32,
    table: &WithholdingTable,
    step_number: u32,
) -> EngineResult<WithholdingTaxResult> {
    let adjustment = DependentAdjustment::from_table(table);
    let column = adjustment.column(dependents);

    let (band, band_match) = find_band(&table.bands, taxable_income).ok_or_else(|| {
        EngineError::lookup_failure(
            WITHHOLDING_SOURCE,
            format!("no band covers a taxable income of {}", taxable_income),
        )
    })?;

    let table_amount = table_amount(band, band_match, taxable_income, column)?;
    let (amount, dependent_deduction) = adjustment.apply(table_amount, dependents);

    let mut reasoning = format!(
        "Taxable income {} in band [{}, {}), column {}: {}",
        taxable_income,
        band.range_min,
        band.range_max
            .map(|m| m.to_string())
            .unwrap_or_else(|| "open".to_string()),
        column,
        table_amount
    );
    if dependent_deduction > Decimal::ZERO {
        reasoning.push_str(&format!(
            "; {} dependents beyond {} reduce it by {} to {}",
            dependents - adjustment.max_tabulated_dependents,
            adjustment.max_tabulated_dependents,
            dependent_deduction,
            amount
        ));
    }

    let audit_step = AuditStep {
        step_number,
        rule_id: "withholding_tax".to_string(),
        rule_name: "Withholding Income Tax".to_string(),
        basis: "Income Tax Act art. 185; monthly withholding table (kou)".to_string(),
        input: serde_json::json!({
            "taxable_income": taxable_income.to_string(),
            "dependents": dependents
        }),
        output: serde_json::json!({
            "column": column,
            "band_match": band_match,
            "table_amount": table_amount.to_string(),
            "dependent_deduction": dependent_deduction.to_string(),
            "amount": amount.to_string()
        }),
        reasoning,
    };

    Ok(WithholdingTaxResult {
        line: IncomeTaxLine {
            amount,
            taxable_income,
            table_amount,
            dependent_deduction,
            approximated: false,
        },
        audit_step,
    })
}

fn table_amount(
    band: &WithholdingBand,
    band_match: BandMatch,
    taxable_income: Decimal,
    column: u32,
) -> EngineResult<Decimal> {
    let base = band
        .tax_by_dependents
        .get(column as usize)
        .copied()
        .ok_or_else(|| {
            EngineError::lookup_failure(
                WITHHOLDING_SOURCE,
                format!(
                    "band starting at {} has no column for {} dependents",
                    band.range_min, column
                ),
            )
        })?;

    let excess = match (band.excess_rate, band_match) {
        (Some(rate), BandMatch::Interior | BandMatch::ClampedHigh) => {
            ((taxable_income - band.range_min) * rate).floor()
        }
        _ => Decimal::ZERO,
    };

    Ok(base + excess)
}
