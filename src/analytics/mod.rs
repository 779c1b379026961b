//! Payroll analytics: anomaly detection, health score and salary forecasts.
//!
//! The analytics layer consumes completed payroll entries and their history.
//! It never changes an entry; persistence goes through the
//! [`PayrollRepository`] trait.

mod anomaly_detection;
mod forecast;
mod health_score;
mod repository;

pub use anomaly_detection::{AnomalyDetectionConfig, detect_anomalies, deviation_severity};
pub use forecast::{
    ForecastConfig, MAX_FORECAST_MONTHS, forecast_confidence, generate_salary_forecast,
};
pub use health_score::{MAX_HEALTH_SCORE, calculate_health_score, severity_weight};
pub use repository::{AnomalyScanner, InMemoryRepository, PayrollRepository, ScanReport};
