//! HTTP request handlers for the payroll API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analytics::{calculate_health_score, detect_anomalies, generate_salary_forecast};
use crate::calculation::{compute, validate_minimum_wage, validate_overtime_compliance};

use super::request::{
    CalculationRequest, DetectAnomaliesRequest, ForecastRequest, MinimumWageRequest,
    OvertimeRequest, normalize_tags,
};
use super::response::{ApiError, ApiErrorResponse, DetectAnomaliesResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/payroll/calculate", post(calculate_handler))
        .route("/compliance/minimum-wage", post(minimum_wage_handler))
        .route("/compliance/overtime", post(overtime_handler))
        .route("/anomalies/detect", post(detect_anomalies_handler))
        .route("/forecast", post(forecast_handler))
        .with_state(state)
}

fn json_ok<T: Serialize>(body: T) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

/// Decodes the request body or turns the failure into an error response.
///
/// Syntax errors and missing fields are 400s. Unknown employment type or
/// industry tags are reported as the engine's unsupported-configuration
/// errors.
fn parse_body<T: DeserializeOwned>(
    payload: Result<Json<Value>, JsonRejection>,
    correlation_id: Uuid,
) -> Result<T, Response> {
    let mut body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            let error = match rejection {
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
            return Err(ApiErrorResponse::bad_request(error).into_response());
        }
    };

    if let Err(err) = normalize_tags(&mut body) {
        return Err(engine_error_response(err, correlation_id));
    }

    serde_json::from_value(body).map_err(|err| {
        // serde's message, e.g. "missing field `id`"
        let message = err.to_string();
        warn!(
            correlation_id = %correlation_id,
            error = %message,
            "JSON data error"
        );
        let error = if message.contains("missing field") {
            ApiError::validation_error(message)
        } else {
            ApiError::malformed_json(message)
        };
        ApiErrorResponse::bad_request(error).into_response()
    })
}

fn engine_error_response(err: crate::error::EngineError, correlation_id: Uuid) -> Response {
    warn!(
        correlation_id = %correlation_id,
        error = %err,
        "Request failed"
    );
    ApiErrorResponse::from(err).into_response()
}

/// Handler for POST /payroll/calculate.
///
/// Runs the full gross-to-net calculation and returns the payroll entry.
async fn calculate_handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing payroll calculation request");

    let request = match parse_body::<CalculationRequest>(payload, correlation_id) {
        Ok(req) => req,
        Err(response) => return response,
    };

    let start_time = Instant::now();
    match compute(&request, state.rates()) {
        Ok(entry) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = %entry.employee_id,
                period = %entry.period,
                gross_salary = %entry.salary.gross_salary,
                final_net_salary = %entry.final_net_salary,
                duration_us = start_time.elapsed().as_micros(),
                "Payroll calculation completed successfully"
            );
            json_ok(entry)
        }
        Err(err) => engine_error_response(err, correlation_id),
    }
}

/// Handler for POST /compliance/minimum-wage.
async fn minimum_wage_handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing minimum wage check");

    let request = match parse_body::<MinimumWageRequest>(payload, correlation_id) {
        Ok(req) => req,
        Err(response) => return response,
    };

    let result = request.period.validate().and_then(|_| {
        let table = state.rates().get(request.period.year)?;
        validate_minimum_wage(&request.employee, &request.working_time, table)
    });
    match result {
        Ok(check) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = %request.employee.id,
                is_valid = check.is_valid,
                "Minimum wage check completed"
            );
            json_ok(check)
        }
        Err(err) => engine_error_response(err, correlation_id),
    }
}

/// Handler for POST /compliance/overtime.
async fn overtime_handler(payload: Result<Json<Value>, JsonRejection>) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing overtime check");

    let request = match parse_body::<OvertimeRequest>(payload, correlation_id) {
        Ok(req) => req,
        Err(response) => return response,
    };

    if let Err(err) = request.working_time.validate() {
        return engine_error_response(err, correlation_id);
    }
    let check = validate_overtime_compliance(&request.employee, &request.working_time);
    info!(
        correlation_id = %correlation_id,
        employee_id = %request.employee.id,
        is_compliant = check.is_compliant,
        "Overtime check completed"
    );
    json_ok(check)
}

/// Handler for POST /anomalies/detect.
///
/// Returns only the anomalies raised by this run. The health score also
/// counts the open anomalies passed in.
async fn detect_anomalies_handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing anomaly detection request");

    let request = match parse_body::<DetectAnomaliesRequest>(payload, correlation_id) {
        Ok(req) => req,
        Err(response) => return response,
    };

    let start_time = Instant::now();
    let anomalies = detect_anomalies(
        &request.employees,
        &request.new_entries,
        &request.history,
        &request.open_anomalies,
        state.rates(),
        &request.config,
        request.detected_at.unwrap_or_else(Utc::now),
    );
    let all: Vec<_> = request
        .open_anomalies
        .iter()
        .chain(anomalies.iter())
        .cloned()
        .collect();
    let health_score = calculate_health_score(&all);

    info!(
        correlation_id = %correlation_id,
        entries = request.new_entries.len(),
        anomalies = anomalies.len(),
        health_score,
        duration_us = start_time.elapsed().as_micros(),
        "Anomaly detection completed"
    );
    json_ok(DetectAnomaliesResponse {
        anomalies,
        health_score,
    })
}

/// Handler for POST /forecast.
async fn forecast_handler(payload: Result<Json<Value>, JsonRejection>) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing forecast request");

    let request = match parse_body::<ForecastRequest>(payload, correlation_id) {
        Ok(req) => req,
        Err(response) => return response,
    };

    match generate_salary_forecast(
        &request.employee_id,
        &request.history,
        request.months,
        &request.config,
    ) {
        Ok(forecast) => {
            info!(
                correlation_id = %correlation_id,
                employee_id = %forecast.employee_id,
                months = request.months,
                confidence = %forecast.confidence,
                "Forecast completed"
            );
            json_ok(forecast)
        }
        Err(err) => engine_error_response(err, correlation_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateRegistry;
    use crate::models::{
        Employee, EmploymentType, IndustryConfig, PayrollEntry, PayrollPeriod, TaxClass,
    };
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tower::ServiceExt;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_state() -> AppState {
        let rates = RateRegistry::load("./config/rates").expect("Failed to load rate tables");
        AppState::new(rates)
    }

    fn create_valid_request() -> CalculationRequest {
        CalculationRequest {
            employee: Employee {
                id: "emp_001".to_string(),
                name: "Erika Mustermann".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1995, 1, 1).unwrap(),
                state: "NW".to_string(),
                church_tax: false,
                tax_class: TaxClass::I,
                child_allowances: Decimal::ZERO,
                weekly_hours: Decimal::from(40),
                monthly_salary: Decimal::from(3500),
                hourly_wage: None,
                employment_type: EmploymentType::Fulltime,
                industry: IndustryConfig::Standard,
            },
            period: PayrollPeriod::new(2025, 5).unwrap(),
            working_time: Default::default(),
            additions: Default::default(),
            deductions: Default::default(),
            industry_input: Default::default(),
        }
    }

    fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(body.into())
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_request_returns_200() {
        let router = create_router(create_test_state());
        let body = serde_json::to_string(&create_valid_request()).unwrap();

        let response = router.oneshot(post("/payroll/calculate", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get("content-type").unwrap();
        assert_eq!(content_type, "application/json");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let entry: PayrollEntry = serde_json::from_slice(&body).unwrap();
        assert_eq!(entry.employee_id, "emp_001");
        assert_eq!(entry.final_net_salary, dec("2333.62"));
        assert!(!entry.audit_trace.steps.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_returns_400() {
        let router = create_router(create_test_state());

        let response = router
            .oneshot(post("/payroll/calculate", "{invalid json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "MALFORMED_JSON");
    }

    #[tokio::test]
    async fn test_missing_field_returns_validation_error() {
        let router = create_router(create_test_state());
        let body = r#"{ "period": { "year": 2025, "month": 5 } }"#;

        let response = router.oneshot(post("/payroll/calculate", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "VALIDATION_ERROR");
        assert!(error.message.contains("employee"));
    }

    #[tokio::test]
    async fn test_unsupported_year_returns_422() {
        let router = create_router(create_test_state());
        let mut request = create_valid_request();
        request.period = PayrollPeriod::new(2019, 5).unwrap();
        let body = serde_json::to_string(&request).unwrap();

        let response = router.oneshot(post("/payroll/calculate", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "UNSUPPORTED_TAX_YEAR");
    }

    #[tokio::test]
    async fn test_negative_salary_returns_400() {
        let router = create_router(create_test_state());
        let mut request = create_valid_request();
        request.employee.monthly_salary = Decimal::from(-1);
        let body = serde_json::to_string(&request).unwrap();

        let response = router.oneshot(post("/payroll/calculate", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_industry_returns_422() {
        let router = create_router(create_test_state());
        let mut body = serde_json::to_value(create_valid_request()).unwrap();
        body["employee"]["industry"] = serde_json::json!({ "type": "mining" });

        let response = router
            .oneshot(post("/payroll/calculate", body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "UNSUPPORTED_INDUSTRY");
    }
}
