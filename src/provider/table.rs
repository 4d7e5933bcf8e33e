//! Rate provider backed by the local scheme tables.

use async_trait::async_trait;
use std::sync::Arc;

use crate::calculation::{
    calculate_employment_insurance, calculate_health_insurance, calculate_pension_insurance,
    resolve_standard_remuneration, resolve_withholding_tax,
};
use crate::config::ConfigLoader;
use crate::error::EngineResult;
use crate::models::AgeCategory;

use super::{EmploymentQuote, HealthQuote, PensionQuote, RateProvider, RateQuery, TaxQuote};

/// Answers every lookup from a loaded [`ConfigLoader`].
///
/// Lookups never touch the network and only fail on a table that does not
/// cover the queried amount.
#[derive(Debug, Clone)]
pub struct TableRateProvider {
    config: Arc<ConfigLoader>,
}

impl TableRateProvider {
    /// Creates a provider over a loaded scheme.
    pub fn new(config: Arc<ConfigLoader>) -> Self {
        Self { config }
    }

    /// The scheme the provider answers from.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }
}

#[async_trait]
impl RateProvider for TableRateProvider {
    fn name(&self) -> &str {
        "table"
    }

    fn scheme_code(&self) -> &str {
        &self.config.metadata().code
    }

    async fn health_insurance(&self, query: &RateQuery) -> EngineResult<HealthQuote> {
        let standard = resolve_standard_remuneration(
            query.monthly_salary,
            self.config.standard_remuneration_bands(),
            self.config.pension_rates(),
            0,
        )?;
        let health = calculate_health_insurance(
            standard.health_standard,
            AgeCategory::from_age(query.age),
            &self.config.config().rates().health,
            0,
        )?;
        let gross_tax = resolve_withholding_tax(
            query.monthly_salary,
            query.dependents,
            self.config.withholding_table(),
            0,
        )?;

        Ok(HealthQuote {
            standard_remuneration: standard.health_standard,
            health: health.health,
            nursing_care: health.nursing_care,
            gross_income_tax: Some(gross_tax.line),
            audit_steps: vec![standard.audit_step, health.audit_step],
        })
    }

    async fn employment_insurance(&self, query: &RateQuery) -> EngineResult<EmploymentQuote> {
        let employment = calculate_employment_insurance(
            query.monthly_salary,
            query.employment_type,
            self.config.employment_rate(query.employment_type),
            0,
        )?;

        Ok(EmploymentQuote {
            employment: employment.line,
            audit_steps: vec![employment.audit_step],
        })
    }

    async fn pension_insurance(&self, query: &RateQuery) -> EngineResult<PensionQuote> {
        let standard = resolve_standard_remuneration(
            query.monthly_salary,
            self.config.standard_remuneration_bands(),
            self.config.pension_rates(),
            0,
        )?;
        let pension =
            calculate_pension_insurance(standard.pension_standard, self.config.pension_rates(), 0)?;

        Ok(PensionQuote {
            pension_standard: standard.pension_standard,
            pension: pension.line,
            audit_steps: vec![pension.audit_step],
        })
    }

    async fn withholding_tax(&self, query: &RateQuery) -> EngineResult<TaxQuote> {
        let tax = resolve_withholding_tax(
            query.monthly_salary,
            query.dependents,
            self.config.withholding_table(),
            0,
        )?;

        Ok(TaxQuote {
            income_tax: tax.line,
            audit_steps: vec![tax.audit_step],
        })
    }
}
