//! Error types for the deduction engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while resolving rates and
//! computing deductions.

use thiserror::Error;

/// The message shown to end users when a calculation cannot be completed.
pub const CALCULATION_FAILED_MESSAGE: &str = "Deduction calculation failed, please retry";

/// The main error type for the deduction engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use deduction_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/rates.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/rates.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but violates a table invariant.
    #[error("Invalid configuration: {message}")]
    ConfigInvalid {
        /// A description of the violated invariant.
        message: String,
    },

    /// An input value reaching the engine was negative, missing or malformed.
    #[error("Invalid input '{field}': {message}")]
    InvalidInput {
        /// The input field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A rate table or remote provider could not resolve a value.
    #[error("Lookup failed for {source_name}: {message}")]
    LookupFailure {
        /// The table or service that failed (e.g. "health_insurance").
        source_name: String,
        /// A description of the failure.
        message: String,
    },

    /// A lookup did not complete within its time budget.
    #[error("Lookup for {source_name} timed out after {timeout_ms}ms")]
    LookupTimeout {
        /// The table or service that timed out.
        source_name: String,
        /// The budget that was exceeded, in milliseconds.
        timeout_ms: u64,
    },

    /// A category required for the summary failed; wraps the underlying cause.
    #[error("Deduction calculation failed, please retry")]
    CalculationFailure {
        /// The category that failed (e.g. "pension_insurance").
        category: String,
        /// The underlying error.
        #[source]
        cause: Box<EngineError>,
    },
}

impl EngineError {
    /// Builds an `InvalidInput` error.
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Builds a `LookupFailure` error.
    pub fn lookup_failure(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::LookupFailure {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Wraps an error as the user-facing `CalculationFailure` for a category.
    pub fn calculation_failure(category: impl Into<String>, cause: EngineError) -> Self {
        EngineError::CalculationFailure {
            category: category.into(),
            cause: Box::new(cause),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_config_not_found_displays_path() {
        let error = EngineError::ConfigNotFound {
            path: "/missing/rates.yaml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found: /missing/rates.yaml"
        );
    }

    #[test]
    fn test_config_parse_error_displays_path_and_message() {
        let error = EngineError::ConfigParseError {
            path: "/config/bad.yaml".to_string(),
            message: "invalid YAML syntax".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to parse configuration file '/config/bad.yaml': invalid YAML syntax"
        );
    }

    #[test]
    fn test_invalid_input_displays_field_and_message() {
        let error = EngineError::invalid_input("salary", "must not be negative");
        assert_eq!(
            error.to_string(),
            "Invalid input 'salary': must not be negative"
        );
    }

    #[test]
    fn test_lookup_failure_displays_source() {
        let error = EngineError::lookup_failure("withholding_table", "no covering band");
        assert_eq!(
            error.to_string(),
            "Lookup failed for withholding_table: no covering band"
        );
    }

    #[test]
    fn test_lookup_timeout_displays_budget() {
        let error = EngineError::LookupTimeout {
            source_name: "pension_insurance".to_string(),
            timeout_ms: 5000,
        };
        assert_eq!(
            error.to_string(),
            "Lookup for pension_insurance timed out after 5000ms"
        );
    }

    #[test]
    fn test_calculation_failure_shows_single_message_and_keeps_cause() {
        let error = EngineError::calculation_failure(
            "health_insurance",
            EngineError::lookup_failure("health_insurance", "connection refused"),
        );
        assert_eq!(error.to_string(), CALCULATION_FAILED_MESSAGE);

        let cause = error.source().expect("cause should be attached");
        assert!(cause.to_string().contains("connection refused"));
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_invalid_input() -> EngineResult<()> {
            Err(EngineError::invalid_input("age", "must be set"))
        }

        fn propagates_error() -> EngineResult<()> {
            returns_invalid_input()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
