//! HTTP API module for the payroll engine.
//!
//! This module exposes gross-to-net calculation, compliance checks, anomaly
//! detection and salary forecasts as JSON endpoints.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    CalculationRequest, DetectAnomaliesRequest, ForecastRequest, MinimumWageRequest,
    OvertimeRequest,
};
pub use response::{ApiError, ApiErrorResponse, DetectAnomaliesResponse};
pub use state::AppState;
