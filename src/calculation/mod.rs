//! Calculation logic for the deduction engine.
//!
//! This module contains the pure calculation functions: banded table lookup,
//! the round-half-down rule for shared contributions, standard remuneration
//! resolution, health, pension and employment insurance contributions,
//! withholding income tax, and aggregation into the final result.

mod aggregate;
mod band_lookup;
mod contribution;
mod engine;
mod rounding;
mod standard_remuneration;
mod withholding_tax;

pub use aggregate::{AggregationContext, DeductionLines, aggregate, taxable_income};
pub use band_lookup::{BandMatch, RangeBand, find_band, validate_bands};
pub use contribution::{
    ContributionResult, ContributionSplit, HealthContributionResult,
    calculate_employment_insurance, calculate_health_insurance, calculate_pension_insurance,
    split_contribution,
};
pub use engine::calculate_deductions;
pub use rounding::{half_tolerance, round_half_down};
pub use standard_remuneration::{
    STANDARD_REMUNERATION_SOURCE, StandardRemunerationResult, resolve_standard_remuneration,
};
pub use withholding_tax::{
    DependentAdjustment, WITHHOLDING_SOURCE, WithholdingTaxResult, resolve_withholding_tax,
};
