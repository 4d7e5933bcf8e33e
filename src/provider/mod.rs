//! Rate providers.
//!
//! A [`RateProvider`] answers the per-category lookups the pipeline needs:
//! health insurance (with nursing care and the standard remuneration),
//! employment insurance, welfare pension, and withholding tax for a given
//! taxable income. [`TableRateProvider`] answers from the local scheme
//! tables; [`RemoteRateProvider`] calls the remote insurance services.

mod remote;
mod table;
mod wire;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::EngineResult;
use crate::models::{AuditStep, ContributionLine, DeductionInput, EmploymentType, IncomeTaxLine};

pub use remote::RemoteRateProvider;
pub use table::TableRateProvider;
pub use wire::{
    CostBreakdown, EmploymentInsuranceResponse, EmploymentOnlyCost, InsuranceCostResponse,
    PensionInsuranceResponse, PensionOnlyCost,
};

/// Category name of health insurance in errors, logs and warnings.
pub const CATEGORY_HEALTH: &str = "health_insurance";
/// Category name of employment insurance.
pub const CATEGORY_EMPLOYMENT: &str = "employment_insurance";
/// Category name of the welfare pension.
pub const CATEGORY_PENSION: &str = "pension_insurance";
/// Category name of withholding income tax.
pub const CATEGORY_INCOME_TAX: &str = crate::calculation::WITHHOLDING_SOURCE;

/// The parameters of one lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateQuery {
    /// The monthly amount to look up: the salary, or the taxable income for
    /// a withholding tax lookup.
    pub monthly_salary: Decimal,
    /// Age in whole years.
    pub age: u32,
    /// Industry for employment insurance.
    pub employment_type: EmploymentType,
    /// Number of dependents for withholding tax.
    pub dependents: u32,
}

impl RateQuery {
    /// Builds the query for a calculation input.
    pub fn from_input(input: &DeductionInput) -> Self {
        Self {
            monthly_salary: input.salary,
            age: input.age,
            employment_type: input.employment_type,
            dependents: input.dependents,
        }
    }

    /// The same query for a different monthly amount.
    pub fn with_amount(&self, monthly_salary: Decimal) -> Self {
        Self {
            monthly_salary,
            ..self.clone()
        }
    }
}

/// Health insurance lookup result.
#[derive(Debug, Clone)]
pub struct HealthQuote {
    /// Standard monthly remuneration for health insurance.
    pub standard_remuneration: Decimal,
    /// Health insurance, nursing care included when applicable.
    pub health: ContributionLine,
    /// The nursing care portion of `health`.
    pub nursing_care: ContributionLine,
    /// Withholding tax on the gross salary, when the provider reports it.
    /// Used only if the tax lookup on the taxable income fails.
    pub gross_income_tax: Option<IncomeTaxLine>,
    /// Audit steps recorded by the provider.
    pub audit_steps: Vec<AuditStep>,
}

/// Welfare pension lookup result.
#[derive(Debug, Clone)]
pub struct PensionQuote {
    /// Standard monthly remuneration for the pension.
    pub pension_standard: Decimal,
    /// Welfare pension.
    pub pension: ContributionLine,
    /// Audit steps recorded by the provider.
    pub audit_steps: Vec<AuditStep>,
}

/// Employment insurance lookup result.
#[derive(Debug, Clone)]
pub struct EmploymentQuote {
    /// Employment insurance.
    pub employment: ContributionLine,
    /// Audit steps recorded by the provider.
    pub audit_steps: Vec<AuditStep>,
}

/// Withholding tax lookup result.
#[derive(Debug, Clone)]
pub struct TaxQuote {
    /// Withholding income tax.
    pub income_tax: IncomeTaxLine,
    /// Audit steps recorded by the provider.
    pub audit_steps: Vec<AuditStep>,
}

/// A source of contribution amounts and withholding tax.
///
/// Implementations must be cancel-safe: the pipeline drops in-flight lookups
/// when a calculation is abandoned or a lookup times out.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Short name used in logs (e.g. "table", "remote").
    fn name(&self) -> &str;

    /// Code of the rate scheme the amounts come from.
    fn scheme_code(&self) -> &str;

    /// Looks up health insurance for `query.monthly_salary` and `query.age`.
    async fn health_insurance(&self, query: &RateQuery) -> EngineResult<HealthQuote>;

    /// Looks up employment insurance for `query.monthly_salary`.
    async fn employment_insurance(&self, query: &RateQuery) -> EngineResult<EmploymentQuote>;

    /// Looks up the welfare pension for `query.monthly_salary`.
    async fn pension_insurance(&self, query: &RateQuery) -> EngineResult<PensionQuote>;

    /// Looks up withholding tax with `query.monthly_salary` as the taxable
    /// income, including the adjustment for dependents beyond the table.
    async fn withholding_tax(&self, query: &RateQuery) -> EngineResult<TaxQuote>;
}
