//! HTTP request handlers for the deduction engine API.
//!
//! This module contains the handler functions for all API endpoints.
//! `POST /calculate` runs the deduction pipeline. The per-category
//! `GET .../calculate` endpoints answer from the loaded scheme tables in the
//! wire format the remote provider reads, so one instance can serve as the
//! rate source of another.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{
    DependentAdjustment, calculate_employment_insurance, calculate_health_insurance,
    calculate_pension_insurance, resolve_standard_remuneration, resolve_withholding_tax,
};
use crate::config::ConfigLoader;
use crate::error::{EngineError, EngineResult};
use crate::models::{AgeCategory, CalculatorInput};
use crate::provider::{
    CostBreakdown, EmploymentInsuranceResponse, EmploymentOnlyCost, InsuranceCostResponse,
    PensionInsuranceResponse, PensionOnlyCost,
};

use super::request::{CalculationRequest, InsuranceQuery};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/calculate", post(calculate_handler))
        .route("/health-insurance/calculate", get(health_insurance_handler))
        .route("/employment-insurance/calculate", get(employment_insurance_handler))
        .route("/pension-insurance/calculate", get(pension_insurance_handler))
        .route("/api/config", get(config_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Handler for POST /calculate endpoint.
///
/// Accepts a calculation request and returns the calculated deductions.
async fn calculate_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculationRequest>, JsonRejection>,
) -> impl IntoResponse {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing calculation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    let body_text = err.body_text();
                    warn!(
                        correlation_id = %correlation_id,
                        error = %body_text,
                        "JSON data error"
                    );
                    ApiError::validation_error(body_text)
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(
                        correlation_id = %correlation_id,
                        error = %err,
                        "JSON syntax error"
                    );
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            return ApiErrorResponse::bad_request(error).into_response();
        }
    };

    let missing = request.missing_fields();
    if !missing.is_empty() {
        info!(
            correlation_id = %correlation_id,
            missing = ?missing,
            "Calculation requested before input was complete"
        );
        return ApiErrorResponse::bad_request(ApiError::input_incomplete(&missing))
            .into_response();
    }

    let input = match CalculatorInput::from(request).to_deduction_input() {
        Ok(input) => input,
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Invalid calculation input");
            return ApiErrorResponse::from(err).into_response();
        }
    };

    let start_time = Instant::now();
    match state.pipeline().calculate(&input).await {
        Ok(result) => {
            info!(
                correlation_id = %correlation_id,
                calculation_id = %result.calculation_id,
                total_deduction = %result.total_deduction,
                net_payment = %result.net_payment,
                duration_us = start_time.elapsed().as_micros(),
                "Calculation completed successfully"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(result),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Calculation failed"
            );
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for GET /health-insurance/calculate.
///
/// Reports every category for the employee and the employer shares of the
/// split contributions. `age` is required.
async fn health_insurance_handler(
    State(state): State<AppState>,
    query: Result<Query<InsuranceQuery>, QueryRejection>,
) -> Result<Response, ApiErrorResponse> {
    let query = parse_query(query)?;
    let age = query
        .age
        .ok_or_else(|| EngineError::invalid_input("age", "must be set"))?;
    Ok(json_ok(insurance_costs(state.config(), &query, age)?))
}

/// Handler for GET /employment-insurance/calculate.
async fn employment_insurance_handler(
    State(state): State<AppState>,
    query: Result<Query<InsuranceQuery>, QueryRejection>,
) -> Result<Response, ApiErrorResponse> {
    let query = parse_query(query)?;
    let config = state.config();
    let employment = calculate_employment_insurance(
        query.monthly_salary,
        query.employment_type,
        config.employment_rate(query.employment_type),
        1,
    )?;

    Ok(json_ok(EmploymentInsuranceResponse {
        employee_cost: EmploymentOnlyCost {
            employment_insurance: Some(employment.line.employee),
        },
        employer_cost: EmploymentOnlyCost::default(),
    }))
}

/// Handler for GET /pension-insurance/calculate.
async fn pension_insurance_handler(
    State(state): State<AppState>,
    query: Result<Query<InsuranceQuery>, QueryRejection>,
) -> Result<Response, ApiErrorResponse> {
    let query = parse_query(query)?;
    let config = state.config();
    let standard = resolve_standard_remuneration(
        query.monthly_salary,
        config.standard_remuneration_bands(),
        config.pension_rates(),
        1,
    )?;
    let pension = calculate_pension_insurance(standard.pension_standard, config.pension_rates(), 2)?;

    Ok(json_ok(PensionInsuranceResponse {
        employee_cost: PensionOnlyCost {
            pension: Some(pension.line.employee),
        },
        employer_cost: PensionOnlyCost {
            pension: Some(pension.line.employer().round()),
        },
    }))
}

/// Handler for GET /api/config: the service endpoints in use.
async fn config_handler(State(state): State<AppState>) -> Response {
    json_ok(state.endpoints().endpoints().await)
}

/// Handler for GET /health.
async fn health_handler(State(state): State<AppState>) -> Response {
    json_ok(serde_json::json!({
        "status": "ok",
        "scheme": state.config().metadata().code,
        "provider": state.pipeline().provider().name(),
    }))
}

fn parse_query(
    query: Result<Query<InsuranceQuery>, QueryRejection>,
) -> Result<InsuranceQuery, ApiErrorResponse> {
    let Query(query) = query.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Invalid query string");
        ApiErrorResponse::bad_request(ApiError::validation_error(rejection.body_text()))
    })?;
    if query.monthly_salary < Decimal::ZERO {
        return Err(EngineError::invalid_input("monthlySalary", "must not be negative").into());
    }
    Ok(query)
}

fn json_ok<T: serde::Serialize>(body: T) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

/// Computes the health service response from the scheme tables.
///
/// Income tax is the table amount for the dependent column, before any
/// adjustment for dependents beyond the table; callers apply that themselves.
fn insurance_costs(
    config: &ConfigLoader,
    query: &InsuranceQuery,
    age: u32,
) -> EngineResult<InsuranceCostResponse> {
    let age_category = AgeCategory::from_age(age);
    let standard = resolve_standard_remuneration(
        query.monthly_salary,
        config.standard_remuneration_bands(),
        config.pension_rates(),
        1,
    )?;
    let health = calculate_health_insurance(
        standard.health_standard,
        age_category,
        &config.config().rates().health,
        2,
    )?;
    let pension = calculate_pension_insurance(standard.pension_standard, config.pension_rates(), 3)?;
    let employment = calculate_employment_insurance(
        query.monthly_salary,
        query.employment_type,
        config.employment_rate(query.employment_type),
        4,
    )?;
    let column = DependentAdjustment::from_table(config.withholding_table()).column(query.dependents);
    let tax = resolve_withholding_tax(query.monthly_salary, column, config.withholding_table(), 5)?;

    let care_employee = health.nursing_care.employee;
    let care_employer = health.nursing_care.employer().round();
    let with_care = age_category.includes_nursing_care();

    Ok(InsuranceCostResponse {
        employee_cost: CostBreakdown {
            care_cost: with_care.then_some(care_employee),
            health_cost_with_no_care: Some(health.health.employee - care_employee),
            pension: Some(pension.line.employee),
            employment_insurance: Some(employment.line.employee),
            income_tax: Some(tax.line.amount),
        },
        employer_cost: CostBreakdown {
            care_cost: with_care.then_some(care_employer),
            health_cost_with_no_care: Some(health.health.employer().round() - care_employer),
            pension: Some(pension.line.employer().round()),
            employment_insurance: None,
            income_tax: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LOOKUP_TIMEOUT;
    use crate::models::CalculationResult;
    use crate::pipeline::DeductionPipeline;
    use crate::provider::{
        EmploymentQuote, HealthQuote, PensionQuote, RateProvider, RateQuery, TaxQuote,
    };
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::str::FromStr;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_state() -> AppState {
        let config = ConfigLoader::load("./config/kanagawa_2025").expect("Failed to load config");
        AppState::new(config)
    }

    /// Provider whose every lookup fails.
    struct DownProvider;

    #[async_trait]
    impl RateProvider for DownProvider {
        fn name(&self) -> &str {
            "down"
        }

        fn scheme_code(&self) -> &str {
            "kanagawa_2025"
        }

        async fn health_insurance(&self, _query: &RateQuery) -> EngineResult<HealthQuote> {
            Err(EngineError::lookup_failure("health_insurance", "service unavailable"))
        }

        async fn employment_insurance(&self, _query: &RateQuery) -> EngineResult<EmploymentQuote> {
            Err(EngineError::lookup_failure("employment_insurance", "service unavailable"))
        }

        async fn pension_insurance(&self, _query: &RateQuery) -> EngineResult<PensionQuote> {
            Err(EngineError::lookup_failure("pension_insurance", "service unavailable"))
        }

        async fn withholding_tax(&self, _query: &RateQuery) -> EngineResult<TaxQuote> {
            Err(EngineError::lookup_failure("withholding_tax", "service unavailable"))
        }
    }

    async fn post_calculate(router: Router, body: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/calculate")
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    /// API-001: Valid request returns 200 with a CalculationResult
    #[tokio::test]
    async fn test_api_001_valid_request_returns_200() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/calculate")
                    .header("Content-Type", "application/json")
                    .body(Body::from(r#"{ "salary": 300000, "age": 35 }"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get("content-type").unwrap();
        assert_eq!(content_type, "application/json");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let result: CalculationResult = serde_json::from_slice(&body).unwrap();

        assert_eq!(result.standard_remuneration, dec("300000"));
        assert_eq!(result.total_deduction, dec("50730"));
        assert_eq!(result.net_payment, dec("249270"));
        assert_eq!(result.audit_trace.steps.len(), 6);
    }

    /// API-002: Malformed JSON returns 400
    #[tokio::test]
    async fn test_api_002_malformed_json_returns_400() {
        let router = create_router(create_test_state());
        let (status, json) = post_calculate(router, "{ not valid json }").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "MALFORMED_JSON");
    }

    /// API-003: Unset salary or age returns INPUT_INCOMPLETE
    #[tokio::test]
    async fn test_api_003_incomplete_input_returns_400() {
        let router = create_router(create_test_state());
        let (status, json) = post_calculate(router, r#"{ "salary": 300000, "age": null }"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INPUT_INCOMPLETE");
        assert_eq!(json["details"], "Missing: age");
    }

    /// API-004: Negative salary returns VALIDATION_ERROR
    #[tokio::test]
    async fn test_api_004_negative_salary_returns_400() {
        let router = create_router(create_test_state());
        let (status, json) = post_calculate(router, r#"{ "salary": -1, "age": 35 }"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    /// API-005: Unknown employment type is a validation error
    #[tokio::test]
    async fn test_api_005_unknown_employment_type_returns_400() {
        let router = create_router(create_test_state());
        let (status, json) = post_calculate(
            router,
            r#"{ "salary": 300000, "age": 35, "employment_type": "mining" }"#,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }

    /// API-006: Missing content type is rejected
    #[tokio::test]
    async fn test_api_006_missing_content_type_returns_400() {
        let router = create_router(create_test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/calculate")
                    .body(Body::from(r#"{ "salary": 300000, "age": 35 }"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "MISSING_CONTENT_TYPE");
    }

    /// API-007: A failing provider yields the user-facing failure message
    #[tokio::test]
    async fn test_api_007_provider_failure_returns_502() {
        let config = Arc::new(ConfigLoader::embedded().unwrap());
        let state = AppState::with_pipeline(
            config,
            DeductionPipeline::new(Arc::new(DownProvider), DEFAULT_LOOKUP_TIMEOUT),
            Arc::new(crate::config::EndpointResolver::fixed(Default::default())),
        );
        let (status, json) =
            post_calculate(create_router(state), r#"{ "salary": 300000, "age": 35 }"#).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["code"], "CALCULATION_FAILED");
        assert_eq!(json["message"], "Deduction calculation failed, please retry");
    }

    /// API-008: Options leave amounts intact but change the totals
    #[tokio::test]
    async fn test_api_008_options_gate_totals() {
        let router = create_router(create_test_state());
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/calculate")
                    .header("Content-Type", "application/json")
                    .body(Body::from(
                        r#"{ "salary": 300000, "age": 35, "options": { "enable_tax": false } }"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let result: CalculationResult = serde_json::from_slice(&body).unwrap();

        assert_eq!(result.income_tax.amount, dec("6750"));
        assert_eq!(result.total_deduction, dec("43980"));
        assert_eq!(result.net_payment, dec("256020"));
    }

    /// API-009: Health endpoint reports every category for under-40s
    #[tokio::test]
    async fn test_api_009_health_insurance_endpoint() {
        let router = create_router(create_test_state());
        let (status, body) = get_json(
            router,
            "/health-insurance/calculate?monthlySalary=300000&age=35",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let costs: InsuranceCostResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(costs.employee_cost.care_cost, None);
        assert_eq!(costs.employee_cost.health_cost_with_no_care, Some(dec("14880")));
        assert_eq!(costs.employee_cost.pension, Some(dec("27450")));
        assert_eq!(costs.employee_cost.employment_insurance, Some(dec("1650")));
        assert_eq!(costs.employee_cost.income_tax, Some(dec("8420")));
        assert_eq!(costs.employer_cost.health_cost_with_no_care, Some(dec("14880")));
        assert_eq!(costs.employer_cost.income_tax, None);
    }

    /// API-010: Health endpoint separates nursing care for 40 to 64
    #[tokio::test]
    async fn test_api_010_health_insurance_endpoint_with_care() {
        let router = create_router(create_test_state());
        let (_, body) = get_json(
            router,
            "/health-insurance/calculate?monthlySalary=300000&age=50",
        )
        .await;

        let costs: InsuranceCostResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(costs.employee_cost.care_cost, Some(dec("2385")));
        assert_eq!(costs.employee_cost.health_cost_with_no_care, Some(dec("14880")));
        assert_eq!(costs.employer_cost.care_cost, Some(dec("2385")));
    }

    /// API-011: Health endpoint requires age
    #[tokio::test]
    async fn test_api_011_health_insurance_requires_age() {
        let router = create_router(create_test_state());
        let (status, body) =
            get_json(router, "/health-insurance/calculate?monthlySalary=300000").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "VALIDATION_ERROR");
    }

    /// API-012: Employment and pension endpoints
    #[tokio::test]
    async fn test_api_012_employment_and_pension_endpoints() {
        let (_, body) = get_json(
            create_router(create_test_state()),
            "/employment-insurance/calculate?monthlySalary=300000&employmentType=construction",
        )
        .await;
        let employment: EmploymentInsuranceResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(employment.employee_cost.employment_insurance, Some(dec("1950")));
        assert_eq!(employment.employer_cost.employment_insurance, None);

        let (_, body) = get_json(
            create_router(create_test_state()),
            "/pension-insurance/calculate?monthlySalary=58000",
        )
        .await;
        let pension: PensionInsuranceResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(pension.employee_cost.pension, Some(dec("8052")));
        assert_eq!(pension.employer_cost.pension, Some(dec("8052")));
    }

    /// API-013: Missing or invalid monthlySalary is rejected
    #[tokio::test]
    async fn test_api_013_invalid_query_returns_400() {
        let (status, _) = get_json(
            create_router(create_test_state()),
            "/pension-insurance/calculate",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json(
            create_router(create_test_state()),
            "/pension-insurance/calculate?monthlySalary=-5",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    /// API-014: Config and liveness endpoints
    #[tokio::test]
    async fn test_api_014_config_and_health() {
        let (status, body) = get_json(create_router(create_test_state()), "/api/config").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["healthInsuranceUrl"], "http://localhost:3001");

        let (status, body) = get_json(create_router(create_test_state()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["provider"], "table");
    }
}
