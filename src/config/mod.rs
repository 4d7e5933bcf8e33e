//! Configuration loading and management for the deduction engine.
//!
//! This module loads rate schemes (insurance rates, standard remuneration
//! grades, withholding tax bands) from YAML files, and reads the service
//! settings and remote endpoints used by the server.
//!
//! # Example
//!
//! ```no_run
//! use deduction_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/kanagawa_2025").unwrap();
//! println!("Loaded scheme: {}", config.metadata().name);
//! ```

mod endpoints;
mod loader;
mod settings;
mod types;

pub use endpoints::{
    DEFAULT_EMPLOYMENT_INSURANCE_URL, DEFAULT_HEALTH_INSURANCE_URL, DEFAULT_PENSION_INSURANCE_URL,
    EndpointResolver, ServiceEndpoints,
};
pub use loader::ConfigLoader;
pub use settings::{AppSettings, DEFAULT_LOOKUP_TIMEOUT, EmploymentRateSource, ProviderKind};
pub use types::{
    EmploymentRates, HealthRates, PensionRates, RatesConfig, SchemeConfig, SchemeMetadata,
    StandardRemunerationBand, WithholdingBand, WithholdingTable,
};
