//! Compliance checks: statutory minimum wage and working-time limits.
//!
//! Both checks report findings as data. A violation never turns into an
//! error; the caller decides whether to block the payroll run.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RateTable;
use crate::error::{EngineError, EngineResult};
use crate::models::{ComplianceWarning, Employee, WEEKS_PER_MONTH, WarningSeverity, WorkingTimeData};

/// Maximum average overtime per working day.
pub const MAX_DAILY_OVERTIME: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// Maximum average working hours per day (§3 ArbZG).
pub const MAX_DAILY_HOURS: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Contracted working days per week.
pub const WORKING_DAYS_PER_WEEK: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Result of a minimum wage check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimumWageCheck {
    /// True if the effective hourly wage meets the minimum wage.
    pub is_valid: bool,
    /// Effective hourly wage, truncated to cents so it never overstates the
    /// wage that was checked.
    pub current_hourly_wage: Decimal,
    /// Statutory minimum wage for the year.
    pub minimum_wage: Decimal,
    /// Missing amount per hour, rounded up to the next cent; zero when valid.
    pub shortfall: Decimal,
    /// Monthly raise needed to reach the minimum wage; zero when valid.
    pub required_adjustment: Decimal,
    /// True if no hours were recorded and contracted hours were used instead.
    pub used_contracted_hours: bool,
    /// Findings.
    pub warnings: Vec<ComplianceWarning>,
}

/// Result of a working-time check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeCheck {
    /// True if both daily limits are respected.
    pub is_compliant: bool,
    /// Overtime per worked day.
    pub average_daily_overtime: Decimal,
    /// Contracted daily hours plus average daily overtime.
    pub average_daily_hours: Decimal,
    /// Human-readable summary.
    pub message: String,
}

/// Checks the effective hourly wage against the statutory minimum wage.
///
/// The effective wage is the contracted monthly gross divided by the
/// recorded regular and overtime hours. Hourly-paid employees are checked on
/// their hourly wage directly. When no hours were recorded, the contracted
/// hours (`weekly_hours × 4.33`) are used and `used_contracted_hours` is set.
///
/// # Errors
///
/// Returns `InvalidInput` if the working time data is invalid or neither
/// recorded nor contracted hours are available for a salaried employee.
///
/// # Examples
///
/// ```
/// use lohnwerk::calculation::validate_minimum_wage;
/// use lohnwerk::config::RateRegistry;
/// use lohnwerk::models::{Employee, WorkingTimeData};
/// use rust_decimal::Decimal;
///
/// let registry = RateRegistry::builtin().unwrap();
/// let employee: Employee = serde_json::from_str(r#"{
///     "id": "emp_001", "name": "Anna", "date_of_birth": "1995-04-01",
///     "state": "NW", "tax_class": 1, "weekly_hours": "40",
///     "monthly_salary": "2000", "employment_type": "fulltime"
/// }"#).unwrap();
/// let working_time = WorkingTimeData {
///     regular_hours: Decimal::from(160),
///     ..WorkingTimeData::default()
/// };
///
/// let check = validate_minimum_wage(&employee, &working_time, registry.get(2025).unwrap()).unwrap();
/// assert!(!check.is_valid);
/// assert_eq!(check.current_hourly_wage, Decimal::new(1250, 2));
/// ```
pub fn validate_minimum_wage(
    employee: &Employee,
    working_time: &WorkingTimeData,
    rates: &RateTable,
) -> EngineResult<MinimumWageCheck> {
    working_time.validate()?;

    let recorded_hours = working_time.regular_hours + working_time.overtime_hours;
    let used_contracted_hours = recorded_hours.is_zero();
    let hours = if used_contracted_hours {
        employee.weekly_hours * WEEKS_PER_MONTH
    } else {
        recorded_hours
    };

    let effective_hourly_wage = match employee.hourly_wage {
        Some(wage) => wage,
        None => {
            if hours.is_zero() {
                return Err(EngineError::invalid_input(
                    "weekly_hours",
                    "no recorded or contracted hours to derive an hourly wage from",
                ));
            }
            employee.monthly_salary / hours
        }
    };

    // Compare before rounding: 12.815 must not pass a 12.82 minimum.
    let minimum_wage = rates.minimum_wage;
    let is_valid = effective_hourly_wage >= minimum_wage;
    let exact_shortfall = (minimum_wage - effective_hourly_wage).max(Decimal::ZERO);
    let shortfall = exact_shortfall.round_dp_with_strategy(2, RoundingStrategy::AwayFromZero);
    let required_adjustment = (exact_shortfall * hours)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let current_hourly_wage =
        effective_hourly_wage.round_dp_with_strategy(2, RoundingStrategy::ToZero);

    let mut warnings = Vec::new();
    if used_contracted_hours {
        warnings.push(ComplianceWarning::new(
            "CONTRACTED_HOURS_USED",
            format!(
                "No hours recorded; checked against {} contracted hours",
                hours.round_dp(2)
            ),
            WarningSeverity::Low,
        ));
    }
    if !is_valid {
        warn!(
            employee_id = %employee.id,
            hourly_wage = %current_hourly_wage,
            minimum_wage = %minimum_wage,
            "Minimum wage violation"
        );
        warnings.push(ComplianceWarning::new(
            "MINIMUM_WAGE_VIOLATION",
            format!(
                "Hourly wage {} EUR is below the minimum wage of {} EUR; {} EUR per month missing",
                current_hourly_wage, minimum_wage, required_adjustment
            ),
            WarningSeverity::High,
        ));
    }

    debug!(
        employee_id = %employee.id,
        year = rates.year,
        hours = %hours,
        hourly_wage = %current_hourly_wage,
        is_valid,
        "Checked minimum wage"
    );

    Ok(MinimumWageCheck {
        is_valid,
        current_hourly_wage,
        minimum_wage,
        shortfall,
        required_adjustment,
        used_contracted_hours,
        warnings,
    })
}

/// Checks average daily overtime and average daily working hours.
///
/// Overtime is averaged over the actual working days, falling back to the
/// expected days. Contracted daily hours are `weekly_hours / 5`.
pub fn validate_overtime_compliance(
    employee: &Employee,
    working_time: &WorkingTimeData,
) -> OvertimeCheck {
    let days = if working_time.actual_working_days > Decimal::ZERO {
        working_time.actual_working_days
    } else {
        working_time.expected_working_days
    };

    let average_daily_overtime = if days > Decimal::ZERO {
        (working_time.overtime_hours / days).round_dp(2)
    } else {
        Decimal::ZERO
    };
    let contract_daily_hours = employee.weekly_hours / WORKING_DAYS_PER_WEEK;
    let average_daily_hours = (contract_daily_hours + average_daily_overtime).round_dp(2);

    let overtime_ok = average_daily_overtime <= MAX_DAILY_OVERTIME;
    let hours_ok = average_daily_hours <= MAX_DAILY_HOURS;
    let is_compliant = overtime_ok && hours_ok;

    let message = match (overtime_ok, hours_ok) {
        (true, true) => format!(
            "Working time compliant: {}h average per day including {}h overtime",
            average_daily_hours, average_daily_overtime
        ),
        (false, true) => format!(
            "Average daily overtime of {}h exceeds the limit of {}h",
            average_daily_overtime, MAX_DAILY_OVERTIME
        ),
        (true, false) => format!(
            "Average daily working time of {}h exceeds the limit of {}h",
            average_daily_hours, MAX_DAILY_HOURS
        ),
        (false, false) => format!(
            "Average daily overtime of {}h and working time of {}h exceed the limits of {}h and {}h",
            average_daily_overtime, average_daily_hours, MAX_DAILY_OVERTIME, MAX_DAILY_HOURS
        ),
    };

    if !is_compliant {
        warn!(employee_id = %employee.id, %message, "Working time violation");
    }

    OvertimeCheck {
        is_compliant,
        average_daily_overtime,
        average_daily_hours,
        message,
    }
}
