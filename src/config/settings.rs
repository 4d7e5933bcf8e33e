//! Service settings read from the environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};

use super::endpoints::ServiceEndpoints;

/// Default per-lookup time budget.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Which rate provider the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Rates and bands from the local scheme tables.
    Table,
    /// Rates fetched from remote insurance services.
    Remote,
}

impl FromStr for ProviderKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(ProviderKind::Table),
            "remote" => Ok(ProviderKind::Remote),
            other => Err(EngineError::ConfigInvalid {
                message: format!("RATE_PROVIDER must be 'table' or 'remote', got '{}'", other),
            }),
        }
    }
}

/// Where the remote provider takes employment insurance from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmploymentRateSource {
    /// Compute from the scheme's rate for the employment type.
    #[default]
    Table,
    /// Use the employment service's amount verbatim.
    Provider,
}

impl FromStr for EmploymentRateSource {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(EmploymentRateSource::Table),
            "provider" => Ok(EmploymentRateSource::Provider),
            other => Err(EngineError::ConfigInvalid {
                message: format!(
                    "EMPLOYMENT_RATE_SOURCE must be 'table' or 'provider', got '{}'",
                    other
                ),
            }),
        }
    }
}

/// Settings for the server binary.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Address the HTTP server binds to.
    pub bind_address: String,
    /// Scheme directory; the embedded scheme is used when unset.
    pub config_dir: Option<PathBuf>,
    /// Which rate provider to use.
    pub provider: ProviderKind,
    /// Remote configuration endpoint (e.g. `https://host/api/config`).
    pub config_service_url: Option<String>,
    /// Statically configured service endpoints.
    pub endpoints: ServiceEndpoints,
    /// Time budget for each rate lookup.
    pub lookup_timeout: Duration,
    /// Employment insurance source for the remote provider.
    pub employment_rate_source: EmploymentRateSource,
}

impl AppSettings {
    /// Reads settings from environment variables, falling back to defaults.
    pub fn from_env() -> EngineResult<Self> {
        let lookup_timeout = match env::var("LOOKUP_TIMEOUT_MS") {
            Ok(value) => Duration::from_millis(value.trim().parse().map_err(|_| {
                EngineError::ConfigInvalid {
                    message: format!("LOOKUP_TIMEOUT_MS must be an integer, got '{}'", value),
                }
            })?),
            Err(_) => DEFAULT_LOOKUP_TIMEOUT,
        };

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            config_dir: env::var("DEDUCTION_CONFIG_DIR").ok().map(PathBuf::from),
            provider: env::var("RATE_PROVIDER")
                .map(|v| v.parse())
                .unwrap_or(Ok(ProviderKind::Table))?,
            config_service_url: env::var("CONFIG_SERVICE_URL").ok(),
            endpoints: ServiceEndpoints::from_env(),
            lookup_timeout,
            employment_rate_source: env::var("EMPLOYMENT_RATE_SOURCE")
                .map(|v| v.parse())
                .unwrap_or(Ok(EmploymentRateSource::Table))?,
        })
    }
}
