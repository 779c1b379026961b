//! Payroll period and worked-time models.
//!
//! This module contains the [`PayrollPeriod`] (a calendar month with an
//! explicit 1-based month number) and the [`WorkingTimeData`] recorded for
//! one employee in one period.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// How many days `actual_working_days` may exceed `expected_working_days`.
pub const WORKING_DAY_TOLERANCE: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// A monthly payroll period.
///
/// `month` is 1-12. Periods order chronologically.
///
/// # Example
///
/// ```
/// use lohnwerk::models::PayrollPeriod;
///
/// let december = PayrollPeriod::new(2024, 12).unwrap();
/// assert_eq!(december.next(), PayrollPeriod::new(2025, 1).unwrap());
/// assert_eq!(december.to_string(), "2024-12");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PayrollPeriod {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
}

impl PayrollPeriod {
    /// Creates a period, rejecting months outside 1-12.
    pub fn new(year: i32, month: u32) -> EngineResult<Self> {
        let period = Self { year, month };
        period.validate()?;
        Ok(period)
    }

    /// Checks that the month is within 1-12.
    pub fn validate(&self) -> EngineResult<()> {
        if !(1..=12).contains(&self.month) {
            return Err(EngineError::invalid_input(
                "period.month",
                format!("{} is not a month (1-12)", self.month),
            ));
        }
        Ok(())
    }

    /// Returns the following month.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Returns the preceding month.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Number of months from `self` to `other` (negative if `other` is earlier).
    pub fn months_until(&self, other: &Self) -> i64 {
        (other.year as i64 - self.year as i64) * 12 + (other.month as i64 - self.month as i64)
    }
}

impl fmt::Display for PayrollPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Worked time for one employee in one period.
///
/// All hour and day fields must be non-negative, and actual working days may
/// exceed expected working days by at most [`WORKING_DAY_TOLERANCE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkingTimeData {
    /// Regular hours worked.
    pub regular_hours: Decimal,
    /// Overtime hours worked.
    pub overtime_hours: Decimal,
    /// Hours worked at night.
    pub night_hours: Decimal,
    /// Hours worked on Sundays.
    pub sunday_hours: Decimal,
    /// Hours worked on public holidays.
    pub holiday_hours: Decimal,
    /// Paid vacation days.
    pub vacation_days: Decimal,
    /// Paid sick days.
    pub sick_days: Decimal,
    /// Days actually worked.
    pub actual_working_days: Decimal,
    /// Working days expected by the contract for the period.
    pub expected_working_days: Decimal,
}

impl WorkingTimeData {
    /// Checks the non-negativity and working-day invariants.
    pub fn validate(&self) -> EngineResult<()> {
        let fields = [
            ("regular_hours", self.regular_hours),
            ("overtime_hours", self.overtime_hours),
            ("night_hours", self.night_hours),
            ("sunday_hours", self.sunday_hours),
            ("holiday_hours", self.holiday_hours),
            ("vacation_days", self.vacation_days),
            ("sick_days", self.sick_days),
            ("actual_working_days", self.actual_working_days),
            ("expected_working_days", self.expected_working_days),
        ];
        for (field, value) in fields {
            if value < Decimal::ZERO {
                return Err(EngineError::invalid_input(
                    field,
                    format!("must not be negative (got {})", value),
                ));
            }
        }

        if self.actual_working_days > self.expected_working_days + WORKING_DAY_TOLERANCE {
            return Err(EngineError::invalid_input(
                "actual_working_days",
                format!(
                    "{} exceeds expected working days {} by more than {}",
                    self.actual_working_days, self.expected_working_days, WORKING_DAY_TOLERANCE
                ),
            ));
        }
        Ok(())
    }

    /// Regular plus overtime hours.
    pub fn total_hours(&self) -> Decimal {
        self.regular_hours + self.overtime_hours
    }

    /// Share of the contracted period that is paid: worked, vacation and sick
    /// days over expected days, capped at 1. A period with no expected days is
    /// paid in full.
    pub fn paid_ratio(&self) -> Decimal {
        if self.expected_working_days.is_zero() {
            return Decimal::ONE;
        }
        let paid_days = self.actual_working_days + self.vacation_days + self.sick_days;
        (paid_days / self.expected_working_days).min(Decimal::ONE)
    }
}
