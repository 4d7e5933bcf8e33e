//! Calculator input models.
//!
//! [`CalculatorInput`] holds the user-entered, possibly incomplete form state.
//! [`DeductionInput`] is the validated, complete input the engine runs on.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};

use super::{CalculationOptions, EmploymentType};

/// Upper bound accepted for an age, in whole years.
pub const MAX_AGE: u32 = 150;

/// A complete, validated set of inputs for one deduction calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionInput {
    /// Monthly gross salary in yen.
    pub salary: Decimal,
    /// Age in whole years.
    pub age: u32,
    /// Industry used for the employment insurance rate.
    pub employment_type: EmploymentType,
    /// Number of dependents for withholding tax.
    pub dependents: u32,
    /// Which categories count toward the totals.
    pub options: CalculationOptions,
}

impl DeductionInput {
    /// Creates an input with general employment, no dependents and all
    /// categories enabled.
    pub fn new(salary: Decimal, age: u32) -> Self {
        Self {
            salary,
            age,
            employment_type: EmploymentType::General,
            dependents: 0,
            options: CalculationOptions::default(),
        }
    }

    /// Re-checks the input before the engine uses it.
    pub fn validate(&self) -> EngineResult<()> {
        if self.salary < Decimal::ZERO {
            return Err(EngineError::invalid_input(
                "salary",
                format!("must not be negative, got {}", self.salary),
            ));
        }
        if self.age > MAX_AGE {
            return Err(EngineError::invalid_input(
                "age",
                format!("must be at most {}, got {}", MAX_AGE, self.age),
            ));
        }
        Ok(())
    }
}

/// Mutable form state as entered by a user.
///
/// `salary` and `age` are `None` while unset. An unset field is never treated
/// as zero: [`CalculatorInput::to_deduction_input`] fails until both are set.
///
/// # Example
///
/// ```
/// use deduction_engine::models::CalculatorInput;
///
/// let mut input = CalculatorInput::default();
/// assert!(!input.is_ready());
///
/// input.set_salary_text("300000").unwrap();
/// input.set_age_text("35").unwrap();
/// assert!(input.is_ready());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatorInput {
    /// Monthly gross salary, if entered.
    pub salary: Option<Decimal>,
    /// Age, if entered.
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

impl CalculatorInput {
    /// Sets the salary from form text. Blank text unsets the field.
    pub fn set_salary_text(&mut self, text: &str) -> EngineResult<()> {
        self.salary = parse_optional(text, "salary", |s| {
            Decimal::from_str(s).ok().filter(|v| *v >= Decimal::ZERO)
        })?;
        Ok(())
    }

    /// Sets the age from form text. Blank text unsets the field.
    pub fn set_age_text(&mut self, text: &str) -> EngineResult<()> {
        self.age = parse_optional(text, "age", |s| s.parse::<u32>().ok())?;
        Ok(())
    }

    /// Sets the dependent count from form text. Blank text means zero
    /// dependents.
    pub fn set_dependents_text(&mut self, text: &str) -> EngineResult<()> {
        self.dependents =
            parse_optional(text, "dependents", |s| s.parse::<u32>().ok())?.unwrap_or(0);
        Ok(())
    }

    /// Returns true when both salary and age are set.
    pub fn is_ready(&self) -> bool {
        self.salary.is_some() && self.age.is_some()
    }

    /// Converts the form state into a validated [`DeductionInput`].
    ///
    /// Fails with `InvalidInput` when salary or age is unset.
    pub fn to_deduction_input(&self) -> EngineResult<DeductionInput> {
        let salary = self
            .salary
            .ok_or_else(|| EngineError::invalid_input("salary", "must be set"))?;
        let age = self
            .age
            .ok_or_else(|| EngineError::invalid_input("age", "must be set"))?;

        let input = DeductionInput {
            salary,
            age,
            employment_type: self.employment_type,
            dependents: self.dependents,
            options: self.options,
        };
        input.validate()?;
        Ok(input)
    }
}

fn parse_optional<T>(
    text: &str,
    field: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> EngineResult<Option<T>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse(trimmed).map(Some).ok_or_else(|| {
        EngineError::invalid_input(
            field,
            format!("'{}' is not a non-negative number", trimmed),
        )
    })
}
