//! Industry configuration, input and result models.
//!
//! Each regulated industry (construction, gastronomy, nursing) carries its own
//! employee configuration and per-period input. The variants are tagged enums
//! so that dispatch over industries is exhaustive.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

use super::AdvisoryWarning;

/// The industry an employee works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndustryType {
    /// No industry-specific rules.
    Standard,
    /// Construction (Baugewerbe).
    Construction,
    /// Gastronomy (Gastgewerbe).
    Gastronomy,
    /// Nursing and care (Pflege).
    Nursing,
}

impl FromStr for IndustryType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "construction" => Ok(Self::Construction),
            "gastronomy" => Ok(Self::Gastronomy),
            "nursing" => Ok(Self::Nursing),
            _ => Err(EngineError::UnsupportedIndustry {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for IndustryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Standard => "standard",
            Self::Construction => "construction",
            Self::Gastronomy => "gastronomy",
            Self::Nursing => "nursing",
        };
        write!(f, "{}", s)
    }
}

/// Construction-specific employee configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstructionConfig {
    /// Hourly wage for premiums; defaults to the employee's hourly rate.
    #[serde(default)]
    pub hourly_wage: Option<Decimal>,
    /// Whether the employee is entitled to the dirty-work allowance.
    #[serde(default)]
    pub dirty_work_eligible: bool,
}

fn default_true() -> bool {
    true
}

/// Gastronomy-specific employee configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GastronomyConfig {
    /// Whether the employer provides meals.
    #[serde(default = "default_true")]
    pub meals_provided: bool,
}

impl Default for GastronomyConfig {
    fn default() -> Self {
        Self {
            meals_provided: true,
        }
    }
}

fn default_nursing_night_rate() -> Decimal {
    Decimal::new(20, 2)
}

fn default_nursing_sunday_rate() -> Decimal {
    Decimal::new(25, 2)
}

fn default_nursing_holiday_rate() -> Decimal {
    Decimal::new(135, 2)
}

fn default_on_call_factor() -> Decimal {
    Decimal::new(50, 2)
}

/// Nursing-specific employee configuration: contractual premium rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NursingConfig {
    /// Hourly wage for premiums; defaults to the employee's hourly rate.
    #[serde(default)]
    pub hourly_wage: Option<Decimal>,
    /// Night premium as a fraction of the hourly wage.
    #[serde(default = "default_nursing_night_rate")]
    pub night_premium_rate: Decimal,
    /// Sunday premium as a fraction of the hourly wage.
    #[serde(default = "default_nursing_sunday_rate")]
    pub sunday_premium_rate: Decimal,
    /// Holiday premium as a fraction of the hourly wage.
    #[serde(default = "default_nursing_holiday_rate")]
    pub holiday_premium_rate: Decimal,
    /// Share of the hourly wage paid per on-call hour.
    #[serde(default = "default_on_call_factor")]
    pub on_call_factor: Decimal,
}

impl Default for NursingConfig {
    fn default() -> Self {
        Self {
            hourly_wage: None,
            night_premium_rate: default_nursing_night_rate(),
            sunday_premium_rate: default_nursing_sunday_rate(),
            holiday_premium_rate: default_nursing_holiday_rate(),
            on_call_factor: default_on_call_factor(),
        }
    }
}

/// An employee's industry together with its configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndustryConfig {
    /// No industry-specific rules.
    #[default]
    Standard,
    /// Construction.
    Construction(ConstructionConfig),
    /// Gastronomy.
    Gastronomy(GastronomyConfig),
    /// Nursing.
    Nursing(NursingConfig),
}

impl IndustryConfig {
    /// Returns the industry tag.
    pub fn industry_type(&self) -> IndustryType {
        match self {
            Self::Standard => IndustryType::Standard,
            Self::Construction(_) => IndustryType::Construction,
            Self::Gastronomy(_) => IndustryType::Gastronomy,
            Self::Nursing(_) => IndustryType::Nursing,
        }
    }
}

/// Construction period input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructionInput {
    /// Hours worked under winter conditions.
    pub winter_hours: Decimal,
    /// Hours of dirty or hazardous work.
    pub dirty_work_hours: Decimal,
    /// Night hours.
    pub night_hours: Decimal,
    /// Sunday hours.
    pub sunday_hours: Decimal,
    /// Public holiday hours.
    pub holiday_hours: Decimal,
}

/// Gastronomy period input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GastronomyInput {
    /// Breakfasts provided.
    pub breakfasts: u32,
    /// Lunches provided.
    pub lunches: u32,
    /// Dinners provided.
    pub dinners: u32,
    /// Tips paid out by the employer (e.g. from a tip pool run through payroll).
    pub employer_paid_tips: Decimal,
    /// Tips paid directly by guests.
    pub monthly_tips: Decimal,
    /// Days worked, used to sanity-check meal counts.
    pub working_days: u32,
}

/// A worked shift, used to estimate night hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRecord {
    /// Hour of day the shift started (0-23).
    pub start_hour: u32,
    /// Duration of the shift in hours.
    pub duration_hours: Decimal,
}

/// Nursing period input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NursingInput {
    /// On-call hours (Bereitschaftsdienst).
    pub on_call_hours: Decimal,
    /// Night hours recorded explicitly.
    pub night_hours: Decimal,
    /// Sunday hours.
    pub sunday_hours: Decimal,
    /// Public holiday hours.
    pub holiday_hours: Decimal,
    /// Shifts without explicit night hours; night share is estimated.
    pub shifts: Vec<ShiftRecord>,
}

/// Per-industry period input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndustryPayrollInput {
    /// No industry input.
    #[default]
    Standard,
    /// Construction input.
    Construction(ConstructionInput),
    /// Gastronomy input.
    Gastronomy(GastronomyInput),
    /// Nursing input.
    Nursing(NursingInput),
}

impl IndustryPayrollInput {
    /// Returns the industry tag.
    pub fn industry_type(&self) -> IndustryType {
        match self {
            Self::Standard => IndustryType::Standard,
            Self::Construction(_) => IndustryType::Construction,
            Self::Gastronomy(_) => IndustryType::Gastronomy,
            Self::Nursing(_) => IndustryType::Nursing,
        }
    }
}

/// Construction result details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionBreakdown {
    /// Whether the period month is in the winter window.
    pub winter_period: bool,
    /// Tax-free winter allowance.
    pub winter_allowance: Decimal,
    /// Taxable dirty-work allowance.
    pub dirty_work_allowance: Decimal,
    /// Taxable night premium.
    pub night_premium: Decimal,
    /// Taxable Sunday premium.
    pub sunday_premium: Decimal,
    /// Taxable holiday premium.
    pub holiday_premium: Decimal,
    /// SOKA-BAU employer levy.
    pub soka_bau_levy: Decimal,
}

/// Gastronomy result details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GastronomyBreakdown {
    /// Taxable benefit-in-kind for meals.
    pub meal_benefit: Decimal,
    /// Taxable employer-paid tips.
    pub employer_paid_tips: Decimal,
    /// Tax-free guest tips.
    pub guest_tips: Decimal,
}

/// Nursing result details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NursingBreakdown {
    /// Taxable on-call pay.
    pub on_call_pay: Decimal,
    /// Night premium (tax-free and taxable parts).
    pub night_premium: Decimal,
    /// Sunday premium (tax-free and taxable parts).
    pub sunday_premium: Decimal,
    /// Holiday premium (tax-free and taxable parts).
    pub holiday_premium: Decimal,
    /// Premium share within the statutory ceilings.
    pub tax_free_premiums: Decimal,
    /// Premium share above the statutory ceilings.
    pub taxable_premiums: Decimal,
    /// Night hours estimated from shift start times.
    pub estimated_night_hours: Decimal,
}

/// Industry-specific details of a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndustryBreakdown {
    /// No industry-specific amounts.
    #[default]
    Standard,
    /// Construction details.
    Construction(ConstructionBreakdown),
    /// Gastronomy details.
    Gastronomy(GastronomyBreakdown),
    /// Nursing details.
    Nursing(NursingBreakdown),
}

/// Output of an industry surcharge module.
///
/// `additional_gross` always equals `taxable_additions + tax_free_additions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryPayrollResult {
    /// The industry that produced this result.
    pub industry: IndustryType,
    /// Additions subject to tax and social insurance.
    pub taxable_additions: Decimal,
    /// Additions exempt from tax and social insurance.
    pub tax_free_additions: Decimal,
    /// Sum of taxable and tax-free additions.
    pub additional_gross: Decimal,
    /// Employer-only costs such as levies.
    pub employer_additional_costs: Decimal,
    /// Advisory warnings; they never block the monetary result.
    pub warnings: Vec<AdvisoryWarning>,
    /// Industry-specific details.
    pub breakdown: IndustryBreakdown,
}

impl IndustryPayrollResult {
    /// Builds a result, deriving `additional_gross`.
    pub fn new(
        industry: IndustryType,
        taxable_additions: Decimal,
        tax_free_additions: Decimal,
        employer_additional_costs: Decimal,
        warnings: Vec<AdvisoryWarning>,
        breakdown: IndustryBreakdown,
    ) -> Self {
        Self {
            industry,
            taxable_additions,
            tax_free_additions,
            additional_gross: taxable_additions + tax_free_additions,
            employer_additional_costs,
            warnings,
            breakdown,
        }
    }

    /// Value of non-cash benefits (Sachbezüge) included in the taxable
    /// additions. It is taxed like cash but not paid out.
    pub fn benefits_in_kind(&self) -> Decimal {
        match &self.breakdown {
            IndustryBreakdown::Gastronomy(gastronomy) => gastronomy.meal_benefit,
            _ => Decimal::ZERO,
        }
    }

    /// The all-zero result of the standard industry.
    pub fn standard() -> Self {
        Self::new(
            IndustryType::Standard,
            Decimal::ZERO,
            Decimal::ZERO,
            Decimal::ZERO,
            Vec::new(),
            IndustryBreakdown::Standard,
        )
    }
}
