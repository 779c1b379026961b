//! Employee model and related types.
//!
//! This module defines the [`Employee`] struct with the subset of contractual
//! data the payroll engine needs, plus the [`EmploymentType`], [`TaxClass`]
//! and [`Region`] enums.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

use super::{IndustryConfig, WorkingTimeData};

/// Average number of weeks per month used to convert weekly to monthly hours.
pub const WEEKS_PER_MONTH: Decimal = Decimal::from_parts(433, 0, 0, false, 2);

/// States whose pension/unemployment caps follow the east table.
const EAST_STATES: &[&str] = &["BB", "MV", "SN", "ST", "TH"];

/// Represents the type of employment arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmploymentType {
    /// Marginal employment up to the Minijob threshold.
    Minijob,
    /// Employment in the transition band above the Minijob threshold.
    Midijob,
    /// Full-time employment.
    Fulltime,
    /// Part-time employment.
    Parttime,
}

impl FromStr for EmploymentType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minijob" => Ok(Self::Minijob),
            "midijob" => Ok(Self::Midijob),
            "fulltime" => Ok(Self::Fulltime),
            "parttime" => Ok(Self::Parttime),
            _ => Err(EngineError::UnsupportedEmploymentType {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Minijob => "minijob",
            Self::Midijob => "midijob",
            Self::Fulltime => "fulltime",
            Self::Parttime => "parttime",
        };
        write!(f, "{}", s)
    }
}

/// German wage tax class (Steuerklasse I-VI).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaxClass {
    /// Single.
    I,
    /// Single parent.
    II,
    /// Married, higher earner (splitting).
    III,
    /// Married, equal earners.
    IV,
    /// Married, lower earner.
    V,
    /// Second job.
    VI,
}

impl TryFrom<u8> for TaxClass {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::I),
            2 => Ok(Self::II),
            3 => Ok(Self::III),
            4 => Ok(Self::IV),
            5 => Ok(Self::V),
            6 => Ok(Self::VI),
            _ => Err(EngineError::invalid_input(
                "tax_class",
                format!("{} is not a tax class (1-6)", value),
            )),
        }
    }
}

impl From<TaxClass> for u8 {
    fn from(value: TaxClass) -> Self {
        match value {
            TaxClass::I => 1,
            TaxClass::II => 2,
            TaxClass::III => 3,
            TaxClass::IV => 4,
            TaxClass::V => 5,
            TaxClass::VI => 6,
        }
    }
}

/// East/west region for the regional assessment-base caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// Former west German states (and Berlin).
    West,
    /// Former east German states.
    East,
}

/// Represents an employee subject to payroll calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// The employee's date of birth.
    pub date_of_birth: NaiveDate,
    /// Federal state code (e.g. "NW", "BY").
    pub state: String,
    /// Whether the employee is liable to church tax.
    #[serde(default)]
    pub church_tax: bool,
    /// Wage tax class.
    pub tax_class: TaxClass,
    /// Child allowances (Kinderfreibeträge), in steps of 0.5.
    #[serde(default)]
    pub child_allowances: Decimal,
    /// Contracted weekly hours.
    pub weekly_hours: Decimal,
    /// Contracted monthly gross salary.
    pub monthly_salary: Decimal,
    /// Hourly wage for hourly-paid employees; overrides `monthly_salary`.
    #[serde(default)]
    pub hourly_wage: Option<Decimal>,
    /// The type of employment arrangement.
    pub employment_type: EmploymentType,
    /// Industry and its specific configuration.
    #[serde(default)]
    pub industry: IndustryConfig,
}

impl Employee {
    /// Returns the employee's age in completed years on `date`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// # use lohnwerk::models::{Employee, EmploymentType, IndustryConfig, TaxClass};
    /// # use rust_decimal::Decimal;
    /// # let employee = Employee {
    /// #     id: "emp_001".to_string(),
    /// #     name: String::new(),
    /// #     date_of_birth: NaiveDate::from_ymd_opt(1995, 6, 15).unwrap(),
    /// #     state: "NW".to_string(),
    /// #     church_tax: false,
    /// #     tax_class: TaxClass::I,
    /// #     child_allowances: Decimal::ZERO,
    /// #     weekly_hours: Decimal::from(40),
    /// #     monthly_salary: Decimal::from(3500),
    /// #     hourly_wage: None,
    /// #     employment_type: EmploymentType::Fulltime,
    /// #     industry: IndustryConfig::Standard,
    /// # };
    /// let before_birthday = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
    /// let on_birthday = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
    /// assert_eq!(employee.age_on(before_birthday), 29);
    /// assert_eq!(employee.age_on(on_birthday), 30);
    /// ```
    pub fn age_on(&self, date: NaiveDate) -> u32 {
        let mut age = date.year() - self.date_of_birth.year();
        if (date.month(), date.day()) < (self.date_of_birth.month(), self.date_of_birth.day()) {
            age -= 1;
        }
        age.max(0) as u32
    }

    /// Returns the region whose pension caps apply to the employee's state.
    pub fn region(&self) -> Region {
        if EAST_STATES.contains(&self.state.to_uppercase().as_str()) {
            Region::East
        } else {
            Region::West
        }
    }

    /// Returns true if the employee has no child allowances.
    pub fn is_childless(&self) -> bool {
        self.child_allowances <= Decimal::ZERO
    }

    /// Returns true if the employee is paid by the hour.
    pub fn is_hourly_paid(&self) -> bool {
        self.hourly_wage.is_some()
    }

    /// Contracted hours per month (`weekly_hours × 4.33`).
    pub fn contracted_monthly_hours(&self) -> Decimal {
        self.weekly_hours * WEEKS_PER_MONTH
    }

    /// Base gross for a period: recorded hours times the hourly wage, or the
    /// monthly salary times the paid share of the period.
    pub fn base_gross(&self, working_time: &WorkingTimeData) -> Decimal {
        match self.hourly_wage {
            Some(wage) => working_time.total_hours() * wage,
            None => self.monthly_salary * working_time.paid_ratio(),
        }
    }

    /// Returns the hourly rate: the hourly wage, or the monthly salary spread
    /// over the contracted monthly hours.
    pub fn hourly_rate(&self) -> Decimal {
        if let Some(wage) = self.hourly_wage {
            return wage;
        }
        let hours = self.contracted_monthly_hours();
        if hours.is_zero() {
            Decimal::ZERO
        } else {
            self.monthly_salary / hours
        }
    }
}
