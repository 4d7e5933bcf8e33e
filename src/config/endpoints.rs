//! Remote service endpoint configuration.
//!
//! Endpoints are resolved through a fallback chain: the remote configuration
//! service (`GET /api/config`), then environment variables, then static
//! defaults. [`EndpointResolver`] fetches once and keeps the result until
//! [`EndpointResolver::invalidate`] is called.

use serde::{Deserialize, Serialize};
use std::env;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Default base URL of the health insurance service.
pub const DEFAULT_HEALTH_INSURANCE_URL: &str = "http://localhost:3001";
/// Default base URL of the employment insurance service.
pub const DEFAULT_EMPLOYMENT_INSURANCE_URL: &str = "http://localhost:3002";
/// Default base URL of the pension insurance service.
pub const DEFAULT_PENSION_INSURANCE_URL: &str = "http://localhost:3003";

/// Base URLs of the three insurance services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoints {
    /// Health insurance service (also serves care, tax and combined costs).
    pub health_insurance_url: String,
    /// Employment insurance service.
    pub employment_insurance_url: String,
    /// Pension insurance service.
    pub pension_insurance_url: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            health_insurance_url: DEFAULT_HEALTH_INSURANCE_URL.to_string(),
            employment_insurance_url: DEFAULT_EMPLOYMENT_INSURANCE_URL.to_string(),
            pension_insurance_url: DEFAULT_PENSION_INSURANCE_URL.to_string(),
        }
    }
}

impl ServiceEndpoints {
    /// Uses the same base URL for all three services.
    pub fn single(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            health_insurance_url: base_url.clone(),
            employment_insurance_url: base_url.clone(),
            pension_insurance_url: base_url,
        }
    }

    /// Reads `HEALTH_INSURANCE_URL`, `EMPLOYMENT_INSURANCE_URL` and
    /// `PENSION_INSURANCE_URL`, using the defaults for unset variables.
    pub fn from_env() -> Self {
        Self::default().merged(PartialEndpoints {
            health_insurance_url: env::var("HEALTH_INSURANCE_URL").ok(),
            employment_insurance_url: env::var("EMPLOYMENT_INSURANCE_URL").ok(),
            pension_insurance_url: env::var("PENSION_INSURANCE_URL").ok(),
        })
    }

    fn merged(self, partial: PartialEndpoints) -> Self {
        let pick = |value: Option<String>, fallback: String| {
            value.filter(|v| !v.trim().is_empty()).unwrap_or(fallback)
        };
        Self {
            health_insurance_url: pick(partial.health_insurance_url, self.health_insurance_url),
            employment_insurance_url: pick(
                partial.employment_insurance_url,
                self.employment_insurance_url,
            ),
            pension_insurance_url: pick(partial.pension_insurance_url, self.pension_insurance_url),
        }
    }
}

/// A configuration response in which any URL may be missing or null.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialEndpoints {
    #[serde(default)]
    health_insurance_url: Option<String>,
    #[serde(default)]
    employment_insurance_url: Option<String>,
    #[serde(default)]
    pension_insurance_url: Option<String>,
}

/// Resolves service endpoints once and caches them until invalidated.
///
/// The resolver is owned by whoever constructs it and handed to the remote
/// provider; there is no process-wide cache.
#[derive(Debug)]
pub struct EndpointResolver {
    client: reqwest::Client,
    config_url: Option<String>,
    fallback: ServiceEndpoints,
    cached: RwLock<Option<ServiceEndpoints>>,
}

impl EndpointResolver {
    /// Creates a resolver that consults `config_url` first and falls back to
    /// `fallback`.
    pub fn new(
        client: reqwest::Client,
        config_url: Option<String>,
        fallback: ServiceEndpoints,
    ) -> Self {
        Self {
            client,
            config_url,
            fallback,
            cached: RwLock::new(None),
        }
    }

    /// Creates a resolver that always returns `endpoints`.
    pub fn fixed(endpoints: ServiceEndpoints) -> Self {
        Self::new(reqwest::Client::new(), None, endpoints)
    }

    /// Returns the endpoints, fetching them on first use.
    pub async fn endpoints(&self) -> ServiceEndpoints {
        if let Some(endpoints) = self.cached.read().await.as_ref() {
            return endpoints.clone();
        }

        let mut cached = self.cached.write().await;
        if let Some(endpoints) = cached.as_ref() {
            return endpoints.clone();
        }

        let resolved = match self.fetch_remote().await {
            Some(partial) => self.fallback.clone().merged(partial),
            None => self.fallback.clone(),
        };
        debug!(endpoints = ?resolved, "Resolved service endpoints");
        *cached = Some(resolved.clone());
        resolved
    }

    /// Drops the cached endpoints so the next call fetches again.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    async fn fetch_remote(&self) -> Option<PartialEndpoints> {
        let url = self.config_url.as_ref()?;

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(url = %url, error = %err, "Config service unreachable, using defaults");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(url = %url, status = %response.status(), "Config service returned an error, using defaults");
            return None;
        }

        match response.json::<PartialEndpoints>().await {
            Ok(partial) => Some(partial),
            Err(err) => {
                warn!(url = %url, error = %err, "Config service response malformed, using defaults");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_local_services() {
        let endpoints = ServiceEndpoints::default();
        assert_eq!(endpoints.health_insurance_url, "http://localhost:3001");
        assert_eq!(endpoints.employment_insurance_url, "http://localhost:3002");
        assert_eq!(endpoints.pension_insurance_url, "http://localhost:3003");
    }

    #[test]
    fn test_partial_config_keeps_fallback_for_missing_urls() {
        let partial: PartialEndpoints = serde_json::from_str(
            r#"{ "healthInsuranceUrl": "https://health.example", "pensionInsuranceUrl": null }"#,
        )
        .unwrap();

        let merged = ServiceEndpoints::default().merged(partial);
        assert_eq!(merged.health_insurance_url, "https://health.example");
        assert_eq!(merged.employment_insurance_url, DEFAULT_EMPLOYMENT_INSURANCE_URL);
        assert_eq!(merged.pension_insurance_url, DEFAULT_PENSION_INSURANCE_URL);
    }

    #[test]
    fn test_blank_urls_are_ignored() {
        let merged = ServiceEndpoints::default().merged(PartialEndpoints {
            health_insurance_url: Some("  ".to_string()),
            ..Default::default()
        });
        assert_eq!(merged.health_insurance_url, DEFAULT_HEALTH_INSURANCE_URL);
    }

    #[test]
    fn test_serializes_as_camel_case() {
        let json = serde_json::to_value(ServiceEndpoints::single("http://x")).unwrap();
        assert_eq!(json["healthInsuranceUrl"], "http://x");
        assert_eq!(json["employmentInsuranceUrl"], "http://x");
        assert_eq!(json["pensionInsuranceUrl"], "http://x");
    }

    #[tokio::test]
    async fn test_fixed_resolver_returns_endpoints() {
        let resolver = EndpointResolver::fixed(ServiceEndpoints::single("http://svc"));
        assert_eq!(
            resolver.endpoints().await,
            ServiceEndpoints::single("http://svc")
        );
    }

    #[tokio::test]
    async fn test_unreachable_config_service_falls_back() {
        let resolver = EndpointResolver::new(
            reqwest::Client::new(),
            Some("http://127.0.0.1:9/api/config".to_string()),
            ServiceEndpoints::single("http://fallback"),
        );

        assert_eq!(
            resolver.endpoints().await,
            ServiceEndpoints::single("http://fallback")
        );

        resolver.invalidate().await;
        assert!(resolver.cached.read().await.is_none());
    }
}
