//! Application state for the deduction engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::{ConfigLoader, DEFAULT_LOOKUP_TIMEOUT, EndpointResolver, ServiceEndpoints};
use crate::pipeline::DeductionPipeline;
use crate::provider::TableRateProvider;

/// Shared application state.
///
/// Holds the loaded rate scheme (served by the per-category endpoints),
/// the pipeline used by `POST /calculate`, and the endpoint resolver
/// reported by `GET /api/config`.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
    pipeline: DeductionPipeline,
    endpoints: Arc<EndpointResolver>,
}

impl AppState {
    /// Creates a state that calculates from the given scheme's tables and
    /// reports the default service endpoints.
    pub fn new(config: ConfigLoader) -> Self {
        let config = Arc::new(config);
        let pipeline = DeductionPipeline::new(
            Arc::new(TableRateProvider::new(Arc::clone(&config))),
            DEFAULT_LOOKUP_TIMEOUT,
        );
        Self {
            config,
            pipeline,
            endpoints: Arc::new(EndpointResolver::fixed(ServiceEndpoints::default())),
        }
    }

    /// Creates a state from already-built parts.
    pub fn with_pipeline(
        config: Arc<ConfigLoader>,
        pipeline: DeductionPipeline,
        endpoints: Arc<EndpointResolver>,
    ) -> Self {
        Self {
            config,
            pipeline,
            endpoints,
        }
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Returns the calculation pipeline.
    pub fn pipeline(&self) -> &DeductionPipeline {
        &self.pipeline
    }

    /// Returns the service endpoint resolver.
    pub fn endpoints(&self) -> &EndpointResolver {
        &self.endpoints
    }
}
