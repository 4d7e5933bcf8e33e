//! Rate provider backed by the remote insurance services.
//!
//! Three services are called over HTTP:
//!
//! - `GET {health}/health-insurance/calculate?monthlySalary=&age=` returns
//!   every category including withholding tax, and is also used for the tax
//!   lookup on the taxable income.
//! - `GET {employment}/employment-insurance/calculate?monthlySalary=`
//! - `GET {pension}/pension-insurance/calculate?monthlySalary=`
//!
//! Each lookup maps to exactly one call, so a failing service fails its own
//! category and the pipeline decides what that means for the calculation.
//! Amounts are sent as whole yen, halves rounded up. Standard remunerations
//! and the reported rates come from the local scheme tables, which the
//! services do not return.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

use crate::calculation::{
    DependentAdjustment, calculate_employment_insurance, resolve_standard_remuneration,
};
use crate::config::{ConfigLoader, EmploymentRateSource, EndpointResolver};
use crate::error::{EngineError, EngineResult};
use crate::models::{AgeCategory, AuditStep, ContributionLine, IncomeTaxLine};

use super::wire::{EmploymentInsuranceResponse, InsuranceCostResponse, PensionInsuranceResponse};
use super::{
    CATEGORY_EMPLOYMENT, CATEGORY_HEALTH, CATEGORY_INCOME_TAX, CATEGORY_PENSION, EmploymentQuote,
    HealthQuote, PensionQuote, RateProvider, RateQuery, TaxQuote,
};

/// Calls the remote health, employment and pension services.
#[derive(Debug, Clone)]
pub struct RemoteRateProvider {
    client: Client,
    endpoints: Arc<EndpointResolver>,
    tables: Arc<ConfigLoader>,
    employment_source: EmploymentRateSource,
}

impl RemoteRateProvider {
    /// Creates a provider.
    ///
    /// `tables` supplies standard remunerations, rates and the dependent
    /// adjustment; with [`EmploymentRateSource::Table`] it also supplies
    /// employment insurance.
    pub fn new(
        client: Client,
        endpoints: Arc<EndpointResolver>,
        tables: Arc<ConfigLoader>,
        employment_source: EmploymentRateSource,
    ) -> Self {
        Self {
            client,
            endpoints,
            tables,
            employment_source,
        }
    }

    async fn health_response(&self, query: &RateQuery) -> EngineResult<(String, InsuranceCostResponse)> {
        let endpoints = self.endpoints.endpoints().await;
        let url = format!(
            "{}/health-insurance/calculate",
            endpoints.health_insurance_url
        );
        let adjustment = DependentAdjustment::from_table(self.tables.withholding_table());
        let params = [
            ("monthlySalary", amount_param(query.monthly_salary)?.to_string()),
            ("age", query.age.to_string()),
            ("dependents", adjustment.column(query.dependents).to_string()),
        ];
        let response = self.get_json(CATEGORY_HEALTH, &url, &params).await?;
        Ok((url, response))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        source: &str,
        url: &str,
        params: &[(&str, String)],
    ) -> EngineResult<T> {
        debug!(source, url, "Requesting remote rates");

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| EngineError::lookup_failure(source, format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(EngineError::lookup_failure(
                source,
                format!("{} returned {}", url, response.status()),
            ));
        }

        response.json::<T>().await.map_err(|e| {
            EngineError::lookup_failure(source, format!("malformed response from {}: {}", url, e))
        })
    }

    fn income_tax_line(&self, taxable_income: Decimal, table_amount: Decimal, dependents: u32) -> IncomeTaxLine {
        let adjustment = DependentAdjustment::from_table(self.tables.withholding_table());
        let (amount, dependent_deduction) = adjustment.apply(table_amount, dependents);
        IncomeTaxLine {
            amount,
            taxable_income,
            table_amount,
            dependent_deduction,
            approximated: false,
        }
    }
}

#[async_trait]
impl RateProvider for RemoteRateProvider {
    fn name(&self) -> &str {
        "remote"
    }

    fn scheme_code(&self) -> &str {
        &self.tables.metadata().code
    }

    async fn health_insurance(&self, query: &RateQuery) -> EngineResult<HealthQuote> {
        let (url, response) = self.health_response(query).await?;
        let employee = &response.employee_cost;
        let employer = &response.employer_cost;

        let health_employee = required(
            employee.health_cost_with_no_care,
            CATEGORY_HEALTH,
            "employeeCost.healthCostWithNoCare",
        )?;
        let care_employee = non_negative(
            employee.care_cost.unwrap_or(Decimal::ZERO),
            CATEGORY_HEALTH,
            "employeeCost.careCost",
        )?;
        // The premium is split equally, so a missing employer amount mirrors
        // the employee's.
        let health_employer = non_negative(
            employer.health_cost_with_no_care.unwrap_or(health_employee),
            CATEGORY_HEALTH,
            "employerCost.healthCostWithNoCare",
        )?;
        let care_employer = non_negative(
            employer.care_cost.unwrap_or(care_employee),
            CATEGORY_HEALTH,
            "employerCost.careCost",
        )?;

        let age_category = AgeCategory::from_age(query.age);
        let rates = &self.tables.config().rates().health;
        let standard = resolve_standard_remuneration(
            query.monthly_salary,
            self.tables.standard_remuneration_bands(),
            self.tables.pension_rates(),
            0,
        )?;

        let gross_income_tax = employee
            .income_tax
            .filter(|t| *t >= Decimal::ZERO)
            .map(|t| self.income_tax_line(query.monthly_salary, t, query.dependents));

        let health = ContributionLine {
            total: health_employee + care_employee + health_employer + care_employer,
            employee: health_employee + care_employee,
            rate: rates.for_age(age_category),
        };
        let nursing_care = ContributionLine {
            total: care_employee + care_employer,
            employee: care_employee,
            rate: if care_employee > Decimal::ZERO {
                rates.nursing_care()
            } else {
                Decimal::ZERO
            },
        };

        let audit_step = remote_step(
            "remote_health_insurance",
            "Health Insurance (remote)",
            &url,
            query,
            serde_json::json!({
                "health_employee": health_employee.to_string(),
                "care_employee": care_employee.to_string(),
                "income_tax": employee.income_tax.map(|t| t.to_string())
            }),
            format!(
                "Health service reported {} health and {} nursing care for the employee",
                health_employee, care_employee
            ),
        );

        Ok(HealthQuote {
            standard_remuneration: standard.health_standard,
            health,
            nursing_care,
            gross_income_tax,
            audit_steps: vec![standard.audit_step, audit_step],
        })
    }

    async fn employment_insurance(&self, query: &RateQuery) -> EngineResult<EmploymentQuote> {
        let rate = self.tables.employment_rate(query.employment_type);

        if self.employment_source == EmploymentRateSource::Table {
            let employment =
                calculate_employment_insurance(query.monthly_salary, query.employment_type, rate, 0)?;
            return Ok(EmploymentQuote {
                employment: employment.line,
                audit_steps: vec![employment.audit_step],
            });
        }

        let endpoints = self.endpoints.endpoints().await;
        let url = format!(
            "{}/employment-insurance/calculate",
            endpoints.employment_insurance_url
        );
        let params = [("monthlySalary", amount_param(query.monthly_salary)?.to_string())];
        let response: EmploymentInsuranceResponse =
            self.get_json(CATEGORY_EMPLOYMENT, &url, &params).await?;

        let employee = required(
            response.employee_cost.employment_insurance,
            CATEGORY_EMPLOYMENT,
            "employeeCost.employmentInsurance",
        )?;

        let audit_step = remote_step(
            "remote_employment_insurance",
            "Employment Insurance (remote)",
            &url,
            query,
            serde_json::json!({ "employee": employee.to_string() }),
            format!("Employment service reported {} for the employee", employee),
        );

        Ok(EmploymentQuote {
            employment: ContributionLine {
                total: employee,
                employee,
                rate,
            },
            audit_steps: vec![audit_step],
        })
    }

    async fn pension_insurance(&self, query: &RateQuery) -> EngineResult<PensionQuote> {
        let endpoints = self.endpoints.endpoints().await;
        let url = format!(
            "{}/pension-insurance/calculate",
            endpoints.pension_insurance_url
        );
        let params = [("monthlySalary", amount_param(query.monthly_salary)?.to_string())];
        let response: PensionInsuranceResponse =
            self.get_json(CATEGORY_PENSION, &url, &params).await?;

        let employee = required(
            response.employee_cost.pension,
            CATEGORY_PENSION,
            "employeeCost.pension",
        )?;
        let employer = non_negative(
            response.employer_cost.pension.unwrap_or(employee),
            CATEGORY_PENSION,
            "employerCost.pension",
        )?;

        let standard = resolve_standard_remuneration(
            query.monthly_salary,
            self.tables.standard_remuneration_bands(),
            self.tables.pension_rates(),
            0,
        )?;

        let audit_step = remote_step(
            "remote_pension_insurance",
            "Welfare Pension Insurance (remote)",
            &url,
            query,
            serde_json::json!({
                "employee": employee.to_string(),
                "employer": employer.to_string()
            }),
            format!("Pension service reported {} for the employee", employee),
        );

        Ok(PensionQuote {
            pension_standard: standard.pension_standard,
            pension: ContributionLine {
                total: employee + employer,
                employee,
                rate: self.tables.pension_rates().rate,
            },
            audit_steps: vec![audit_step],
        })
    }

    async fn withholding_tax(&self, query: &RateQuery) -> EngineResult<TaxQuote> {
        let (url, response) = self
            .health_response(query)
            .await
            .map_err(|e| match e {
                EngineError::LookupFailure { message, .. } => {
                    EngineError::lookup_failure(CATEGORY_INCOME_TAX, message)
                }
                other => other,
            })?;

        let table_amount = required(
            response.employee_cost.income_tax,
            CATEGORY_INCOME_TAX,
            "employeeCost.incomeTax",
        )?;
        let income_tax = self.income_tax_line(query.monthly_salary, table_amount, query.dependents);

        let audit_step = remote_step(
            "remote_withholding_tax",
            "Withholding Income Tax (remote)",
            &url,
            query,
            serde_json::json!({
                "table_amount": table_amount.to_string(),
                "dependent_deduction": income_tax.dependent_deduction.to_string(),
                "amount": income_tax.amount.to_string()
            }),
            format!(
                "Health service reported {} tax on {}, {} after the dependent adjustment",
                table_amount, query.monthly_salary, income_tax.amount
            ),
        );

        Ok(TaxQuote {
            income_tax,
            audit_steps: vec![audit_step],
        })
    }
}

/// Whole yen sent to the services, halves rounded away from zero. Negative
/// amounts are sent as zero.
fn amount_param(amount: Decimal) -> EngineResult<i64> {
    amount
        .max(Decimal::ZERO)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| EngineError::invalid_input("monthlySalary", format!("{} is out of range", amount)))
}

fn required(value: Option<Decimal>, source: &str, field: &str) -> EngineResult<Decimal> {
    let value = value.ok_or_else(|| {
        EngineError::lookup_failure(source, format!("response has no value for {}", field))
    })?;
    non_negative(value, source, field)
}

fn non_negative(value: Decimal, source: &str, field: &str) -> EngineResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(EngineError::lookup_failure(
            source,
            format!("response has a negative {}: {}", field, value),
        ));
    }
    Ok(value)
}

fn remote_step(
    rule_id: &str,
    rule_name: &str,
    url: &str,
    query: &RateQuery,
    output: serde_json::Value,
    reasoning: String,
) -> AuditStep {
    AuditStep {
        step_number: 0,
        rule_id: rule_id.to_string(),
        rule_name: rule_name.to_string(),
        basis: url.to_string(),
        input: serde_json::json!({
            "monthly_salary": query.monthly_salary.to_string(),
            "age": query.age,
            "dependents": query.dependents
        }),
        output,
        reasoning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_amount_param_rounds_to_whole_yen() {
        assert_eq!(amount_param(dec("256020.4")).unwrap(), 256020);
        assert_eq!(amount_param(dec("256020.6")).unwrap(), 256021);
        assert_eq!(amount_param(dec("300000.5")).unwrap(), 300001);
        assert_eq!(amount_param(dec("300001.5")).unwrap(), 300002);
        assert_eq!(amount_param(dec("-100")).unwrap(), 0);
    }

    #[test]
    fn test_required_rejects_null_and_negative() {
        assert!(matches!(
            required(None, CATEGORY_HEALTH, "employeeCost.pension"),
            Err(EngineError::LookupFailure { .. })
        ));
        assert!(matches!(
            required(Some(dec("-1")), CATEGORY_HEALTH, "employeeCost.pension"),
            Err(EngineError::LookupFailure { .. })
        ));
        assert_eq!(
            required(Some(dec("1650")), CATEGORY_HEALTH, "x").unwrap(),
            dec("1650")
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_lookup_failure() {
        let provider = RemoteRateProvider::new(
            Client::new(),
            Arc::new(EndpointResolver::fixed(
                crate::config::ServiceEndpoints::single("http://127.0.0.1:9"),
            )),
            Arc::new(ConfigLoader::embedded().unwrap()),
            EmploymentRateSource::Provider,
        );
        let query = RateQuery::from_input(&crate::models::DeductionInput::new(dec("300000"), 35));

        match provider.pension_insurance(&query).await {
            Err(EngineError::LookupFailure { source_name, .. }) => {
                assert_eq!(source_name, CATEGORY_PENSION)
            }
            other => panic!("Expected LookupFailure, got {:?}", other),
        }
        match provider.withholding_tax(&query).await {
            Err(EngineError::LookupFailure { source_name, .. }) => {
                assert_eq!(source_name, CATEGORY_INCOME_TAX)
            }
            other => panic!("Expected LookupFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_table_employment_source_needs_no_network() {
        let provider = RemoteRateProvider::new(
            Client::new(),
            Arc::new(EndpointResolver::fixed(
                crate::config::ServiceEndpoints::single("http://127.0.0.1:9"),
            )),
            Arc::new(ConfigLoader::embedded().unwrap()),
            EmploymentRateSource::Table,
        );
        let query = RateQuery::from_input(&crate::models::DeductionInput::new(dec("300000"), 35));

        let quote = provider.employment_insurance(&query).await.unwrap();
        assert_eq!(quote.employment.employee, dec("1650"));
    }
}
