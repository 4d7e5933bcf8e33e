//! JSON bodies of the remote insurance services.
//!
//! Amounts travel as JSON numbers and may be `null`; they are read into and
//! written from `Decimal` through `rust_decimal::serde::float_option`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Costs for one payer, as returned by the health insurance service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    /// Nursing care insurance.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub care_cost: Option<Decimal>,
    /// Health insurance excluding nursing care.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub health_cost_with_no_care: Option<Decimal>,
    /// Welfare pension.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub pension: Option<Decimal>,
    /// Employment insurance.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub employment_insurance: Option<Decimal>,
    /// Withholding income tax. Always `null` for the employer.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub income_tax: Option<Decimal>,
}

/// `GET /health-insurance/calculate` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceCostResponse {
    /// Amounts paid by the employee.
    pub employee_cost: CostBreakdown,
    /// Amounts paid by the employer.
    pub employer_cost: CostBreakdown,
}

/// Employment insurance amount for one payer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentOnlyCost {
    /// Employment insurance.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub employment_insurance: Option<Decimal>,
}

/// `GET /employment-insurance/calculate` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentInsuranceResponse {
    /// Amount paid by the employee.
    pub employee_cost: EmploymentOnlyCost,
    /// Amount paid by the employer.
    pub employer_cost: EmploymentOnlyCost,
}

/// Pension amount for one payer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PensionOnlyCost {
    /// Welfare pension.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub pension: Option<Decimal>,
}

/// `GET /pension-insurance/calculate` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PensionInsuranceResponse {
    /// Amount paid by the employee.
    pub employee_cost: PensionOnlyCost,
    /// Amount paid by the employer.
    pub employer_cost: PensionOnlyCost,
}
