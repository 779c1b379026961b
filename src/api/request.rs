//! Request types for the payroll API.
//!
//! The payroll endpoint accepts a [`PayrollInput`] as-is. The compliance,
//! anomaly and forecast endpoints wrap their library arguments in the
//! structs below, with defaults for everything optional.
//!
//! Employment type and industry tags are checked on the raw body before it
//! is decoded, so an unknown tag is reported as unsupported rather than as
//! malformed JSON.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analytics::{AnomalyDetectionConfig, ForecastConfig};
use crate::calculation::PayrollInput;
use crate::error::EngineResult;
use crate::models::{
    Employee, EmploymentType, HistoricalPayrollData, IndustryType, PayrollAnomaly, PayrollEntry,
    PayrollPeriod, WorkingTimeData,
};

/// Request body for `POST /payroll/calculate`.
pub type CalculationRequest = PayrollInput;

/// Request body for `POST /compliance/minimum-wage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimumWageRequest {
    /// The employee to check.
    pub employee: Employee,
    /// The period; its year selects the statutory minimum wage.
    pub period: PayrollPeriod,
    /// Recorded hours; contracted hours are used when none are recorded.
    #[serde(default)]
    pub working_time: WorkingTimeData,
}

/// Request body for `POST /compliance/overtime`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimeRequest {
    /// The employee to check.
    pub employee: Employee,
    /// Recorded hours and working days.
    pub working_time: WorkingTimeData,
}

/// Request body for `POST /anomalies/detect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectAnomaliesRequest {
    /// Employees the entries belong to.
    pub employees: Vec<Employee>,
    /// The entries to examine.
    pub new_entries: Vec<PayrollEntry>,
    /// Earlier periods, not including `new_entries`.
    #[serde(default)]
    pub history: Vec<HistoricalPayrollData>,
    /// Anomalies still open from earlier runs.
    #[serde(default)]
    pub open_anomalies: Vec<PayrollAnomaly>,
    /// Detection thresholds.
    #[serde(default)]
    pub config: AnomalyDetectionConfig,
    /// Detection timestamp; the time of the request when absent.
    #[serde(default)]
    pub detected_at: Option<DateTime<Utc>>,
}

/// Request body for `POST /forecast`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    /// The employee to forecast.
    pub employee_id: String,
    /// Payroll history of the employee.
    pub history: Vec<HistoricalPayrollData>,
    /// Number of months to project.
    pub months: u32,
    /// Growth assumptions.
    #[serde(default)]
    pub config: ForecastConfig,
}

/// Parses `object[key]` with `parse` and writes back its canonical form.
fn canonicalize<T, F>(object: Option<&mut Value>, key: &str, parse: F) -> EngineResult<()>
where
    T: ToString,
    F: Fn(&str) -> EngineResult<T>,
{
    let Some(slot) = object.and_then(|o| o.get_mut(key)) else {
        return Ok(());
    };
    if let Some(raw) = slot.as_str() {
        *slot = Value::String(parse(raw)?.to_string());
    }
    Ok(())
}

fn canonicalize_employee(employee: &mut Value) -> EngineResult<()> {
    canonicalize(Some(&mut *employee), "employment_type", EmploymentType::from_str)?;
    canonicalize(employee.get_mut("industry"), "type", IndustryType::from_str)
}

/// Validates and normalizes the employment type and industry tags of a raw
/// request body.
///
/// Looks at `employee`, every element of `employees` and `industry_input`.
/// Known tags are rewritten to their canonical spelling; other fields are
/// left for the typed decoding.
///
/// # Errors
///
/// - `UnsupportedEmploymentType` for an unknown `employment_type`
/// - `UnsupportedIndustry` for an unknown industry `type`
pub fn normalize_tags(body: &mut Value) -> EngineResult<()> {
    if let Some(employee) = body.get_mut("employee") {
        canonicalize_employee(employee)?;
    }
    if let Some(employees) = body.get_mut("employees").and_then(Value::as_array_mut) {
        for employee in employees {
            canonicalize_employee(employee)?;
        }
    }
    canonicalize(body.get_mut("industry_input"), "type", IndustryType::from_str)
}
