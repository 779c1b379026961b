//! Response types for the payroll API.
//!
//! This module defines the error response structures, the mapping from
//! [`EngineError`] to HTTP status codes, and the bodies of endpoints that do
//! not return a library type directly.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::PayrollAnomaly;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Creates a 400 response.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.error),
        )
            .into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        match error {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ApiErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
                }
            }
            EngineError::InvalidIncome { .. } => {
                ApiErrorResponse::bad_request(ApiError::new("INVALID_INCOME", message))
            }
            EngineError::InvalidSalary { .. } => {
                ApiErrorResponse::bad_request(ApiError::new("INVALID_SALARY", message))
            }
            EngineError::InvalidInput { field, .. } => ApiErrorResponse::bad_request(
                ApiError::with_details(
                    "INVALID_INPUT",
                    message,
                    format!("Field '{}' failed validation", field),
                ),
            ),
            EngineError::AnomalyNotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("ANOMALY_NOT_FOUND", message),
            },
            EngineError::UnsupportedEmploymentType { .. } => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::new("UNSUPPORTED_EMPLOYMENT_TYPE", message),
            },
            EngineError::UnsupportedIndustry { .. } => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::new("UNSUPPORTED_INDUSTRY", message),
            },
            EngineError::UnsupportedTaxYear { year } => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::with_details(
                    "UNSUPPORTED_TAX_YEAR",
                    message,
                    format!("No rate table is loaded for {}", year),
                ),
            },
            EngineError::UnsupportedConfiguration { .. } => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::new("UNSUPPORTED_CONFIGURATION", message),
            },
            EngineError::InvalidAnomalyTransition { .. } => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::new("INVALID_ANOMALY_TRANSITION", message),
            },
        }
    }
}

/// Response body for `POST /anomalies/detect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectAnomaliesResponse {
    /// Anomalies raised by this run.
    pub anomalies: Vec<PayrollAnomaly>,
    /// Health score over the open anomalies passed in plus the new ones.
    pub health_score: u32,
}
