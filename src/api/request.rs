//! Request types for the deduction engine API.
//!
//! These types represent the JSON request bodies and query strings accepted
//! by the HTTP API. They are converted into domain types for calculation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{CalculationOptions, CalculatorInput, EmploymentType};

/// Request body for `POST /calculate`.
///
/// `salary` and `age` may be omitted or null while the caller is still
/// collecting input; such a request is answered with `INPUT_INCOMPLETE`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// Monthly gross salary in yen.
    #[serde(default)]
    pub salary: Option<Decimal>,
    /// Age in whole years.
    #[serde(default)]
    pub age: Option<u32>,
    /// Industry used for the employment insurance rate.
    #[serde(default)]
    pub employment_type: EmploymentType,
    /// Number of dependents.
    #[serde(default)]
    pub dependents: u32,
    /// Which categories count toward the totals.
    #[serde(default)]
    pub options: CalculationOptions,
}

impl From<CalculationRequest> for CalculatorInput {
    fn from(req: CalculationRequest) -> Self {
        CalculatorInput {
            salary: req.salary,
            age: req.age,
            employment_type: req.employment_type,
            dependents: req.dependents,
            options: req.options,
        }
    }
}

impl CalculationRequest {
    /// Names of the required fields that are unset.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.salary.is_none() {
            missing.push("salary");
        }
        if self.age.is_none() {
            missing.push("age");
        }
        missing
    }
}

/// Query string of the per-category insurance endpoints.
///
/// `GET /health-insurance/calculate?monthlySalary=300000&age=35&dependents=0`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceQuery {
    /// Monthly salary in whole yen.
    pub monthly_salary: Decimal,
    /// Age in whole years. Only the health endpoint needs it.
    #[serde(default)]
    pub age: Option<u32>,
    /// Dependent column for the withholding tax figure.
    #[serde(default)]
    pub dependents: u32,
    /// Industry for the employment insurance figure.
    #[serde(default)]
    pub employment_type: EmploymentType,
}
