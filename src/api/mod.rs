//! HTTP API module for the deduction engine.
//!
//! This module provides the REST endpoints: deduction calculation, the
//! per-category insurance lookups, the endpoint configuration and a
//! liveness check.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{CalculationRequest, InsuranceQuery};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
