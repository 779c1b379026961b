//! Salary forecasting.
//!
//! Projects the latest gross salary forward with a fixed annual growth
//! assumption. The reported confidence depends only on the amount of
//! history, not on its variance.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::{ForecastMethod, ForecastPoint, HistoricalPayrollData, SalaryForecast};

/// Longest supported projection in months.
pub const MAX_FORECAST_MONTHS: u32 = 120;

const CONFIDENCE_BASE: Decimal = Decimal::from_parts(50, 0, 0, false, 2);
const CONFIDENCE_PER_POINT: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
const CONFIDENCE_CAP: Decimal = Decimal::from_parts(95, 0, 0, false, 2);

fn default_annual_growth_rate() -> Decimal {
    Decimal::new(3, 2)
}

/// Forecast assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Assumed yearly salary growth as a fraction.
    #[serde(default = "default_annual_growth_rate")]
    pub annual_growth_rate: Decimal,
    /// Extrapolation method.
    #[serde(default)]
    pub method: ForecastMethod,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            annual_growth_rate: default_annual_growth_rate(),
            method: ForecastMethod::default(),
        }
    }
}

/// `min(0.95, 0.5 + 0.05 × data_points)`.
pub fn forecast_confidence(data_points: usize) -> Decimal {
    (CONFIDENCE_BASE + CONFIDENCE_PER_POINT * Decimal::from(data_points)).min(CONFIDENCE_CAP)
}

/// `None` when the factor leaves the representable range.
fn growth_factor(method: ForecastMethod, annual_rate: Decimal, months: u32) -> Option<Decimal> {
    let years = Decimal::from(months) / Decimal::from(12);
    match method {
        ForecastMethod::Linear => annual_rate.checked_mul(years)?.checked_add(Decimal::ONE),
        ForecastMethod::Compound => (Decimal::ONE + annual_rate).checked_powd(years),
    }
}

fn projection_overflow(month: u32, annual_rate: Decimal) -> EngineError {
    EngineError::invalid_input(
        "annual_growth_rate",
        format!(
            "projection overflows at month {} with growth rate {}",
            month, annual_rate
        ),
    )
}

/// Projects an employee's gross and net salary for the coming months.
///
/// The base is the gross of the latest history period. Projected net uses
/// the average net/gross ratio of the history.
///
/// # Errors
///
/// - `InvalidInput` if the employee has no history, `months` exceeds
///   [`MAX_FORECAST_MONTHS`], the growth rate is at or below -100 %, or
///   the projected amounts overflow
pub fn generate_salary_forecast(
    employee_id: &str,
    history: &[HistoricalPayrollData],
    months: u32,
    config: &ForecastConfig,
) -> EngineResult<SalaryForecast> {
    if months > MAX_FORECAST_MONTHS {
        return Err(EngineError::invalid_input(
            "months",
            format!("must be at most {} (got {})", MAX_FORECAST_MONTHS, months),
        ));
    }
    if config.annual_growth_rate <= -Decimal::ONE {
        return Err(EngineError::invalid_input(
            "annual_growth_rate",
            format!("must be above -1 (got {})", config.annual_growth_rate),
        ));
    }

    let mut records: Vec<&HistoricalPayrollData> = history
        .iter()
        .filter(|r| r.employee_id == employee_id)
        .collect();
    records.sort_by_key(|r| r.period);
    let Some(latest) = records.last() else {
        return Err(EngineError::invalid_input(
            "history",
            format!("no payroll history for employee {}", employee_id),
        ));
    };

    let ratios: Vec<Decimal> = records
        .iter()
        .filter(|r| r.gross_salary > Decimal::ZERO)
        .map(|r| r.net_salary / r.gross_salary)
        .collect();
    let net_ratio = if ratios.is_empty() {
        Decimal::ZERO
    } else {
        ratios.iter().copied().sum::<Decimal>() / Decimal::from(ratios.len())
    };

    let base_gross = latest.gross_salary;
    let mut period = latest.period;
    let mut points = Vec::with_capacity(months as usize);
    for month in 1..=months {
        period = period.next();
        let overflow = || projection_overflow(month, config.annual_growth_rate);
        let gross = growth_factor(config.method, config.annual_growth_rate, month)
            .and_then(|factor| base_gross.checked_mul(factor))
            .ok_or_else(overflow)?;
        let net = gross.checked_mul(net_ratio).ok_or_else(overflow)?;
        points.push(ForecastPoint {
            period,
            projected_gross: gross.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            projected_net: net.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        });
    }

    let data_points = records.len();
    debug!(
        employee_id,
        data_points,
        months,
        method = ?config.method,
        "Generated salary forecast"
    );

    Ok(SalaryForecast {
        employee_id: employee_id.to_string(),
        method: config.method,
        annual_growth_rate: config.annual_growth_rate,
        base_gross,
        net_ratio,
        points,
        confidence: forecast_confidence(data_points),
        data_points,
    })
}
