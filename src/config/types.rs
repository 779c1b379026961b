//! Rate table types for payroll calculation.
//!
//! This module contains the strongly-typed structures that are deserialized
//! from the per-year YAML rate files. All rates are fractions (`0.093` is
//! 9.3 %), all amounts are EUR.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::Region;

/// Beitragsbemessungsgrenzen (assessment-base caps) for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentCaps {
    /// Yearly cap for pension and unemployment insurance (west).
    pub pension_west_yearly: Decimal,
    /// Monthly cap for pension and unemployment insurance (west).
    pub pension_west_monthly: Decimal,
    /// Yearly cap for pension and unemployment insurance (east).
    pub pension_east_yearly: Decimal,
    /// Monthly cap for pension and unemployment insurance (east).
    pub pension_east_monthly: Decimal,
    /// Nationwide yearly cap for health and care insurance.
    pub health_yearly: Decimal,
    /// Nationwide monthly cap for health and care insurance.
    pub health_monthly: Decimal,
}

impl AssessmentCaps {
    /// Returns the monthly pension/unemployment cap for a region.
    pub fn pension_monthly(&self, region: Region) -> Decimal {
        match region {
            Region::West => self.pension_west_monthly,
            Region::East => self.pension_east_monthly,
        }
    }

    /// Returns the highest monthly cap of any branch.
    pub fn highest_monthly(&self) -> Decimal {
        self.pension_west_monthly
            .max(self.pension_east_monthly)
            .max(self.health_monthly)
    }
}

/// A contribution rate split between employee and employer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContributionRate {
    /// The combined rate.
    pub total: Decimal,
    /// The employee's share.
    pub employee: Decimal,
    /// The employer's share.
    pub employer: Decimal,
}

/// Health insurance rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthRates {
    /// The statutory general rate.
    pub general_rate: Decimal,
    /// The average additional rate published for the year.
    pub average_additional_rate: Decimal,
}

impl HealthRates {
    /// Returns the combined rate, split 50/50 between employee and employer.
    pub fn as_contribution_rate(&self) -> ContributionRate {
        let total = self.general_rate + self.average_additional_rate;
        let half = total / Decimal::TWO;
        ContributionRate {
            total,
            employee: half,
            employer: half,
        }
    }
}

/// Social insurance section of the rate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialInsuranceRates {
    /// Assessment-base caps.
    pub bbg: AssessmentCaps,
    /// Pension insurance (Rentenversicherung).
    pub pension: ContributionRate,
    /// Unemployment insurance (Arbeitslosenversicherung).
    pub unemployment: ContributionRate,
    /// Health insurance (Krankenversicherung).
    pub health: HealthRates,
    /// Care insurance (Pflegeversicherung).
    pub care: ContributionRate,
    /// Care insurance for childless employees above the age limit.
    pub care_childless: ContributionRate,
    /// Age above which the childless surcharge applies.
    pub care_childless_min_age: u32,
}

/// Minijob and Midijob parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowIncomeRates {
    /// Monthly earnings limit for a Minijob.
    pub minijob_threshold: Decimal,
    /// Flat employer health rate for a Minijob.
    pub minijob_employer_health_rate: Decimal,
    /// Flat employer pension rate for a Minijob.
    pub minijob_employer_pension_rate: Decimal,
    /// Flat payroll tax replacing progressive income tax for a Minijob.
    pub minijob_flat_tax_rate: Decimal,
    /// Upper end of the Midijob transition band.
    pub midijob_upper_limit: Decimal,
    /// Factor F of the transition-band formula.
    pub midijob_factor: Decimal,
}

/// A polynomial tax zone: `(coeff0 * z + coeff1) * z + offset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialZone {
    /// Upper bound of the zone (inclusive).
    pub to: Decimal,
    /// Quadratic coefficient.
    pub coeff0: Decimal,
    /// Linear coefficient.
    pub coeff1: Decimal,
    /// Constant added to the polynomial.
    #[serde(default)]
    pub offset: Decimal,
}

/// A proportional tax zone: `rate * y - constant`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProportionalZone {
    /// Upper bound of the zone (inclusive); absent for the top zone.
    #[serde(default)]
    pub to: Option<Decimal>,
    /// Marginal rate.
    pub rate: Decimal,
    /// Constant subtracted from `rate * y`.
    pub constant: Decimal,
}

/// Income tax section (§32a EStG) plus the allowances the engine applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeTaxRates {
    /// Grundfreibetrag.
    pub basic_allowance: Decimal,
    /// First progression zone.
    pub zone1: PolynomialZone,
    /// Second progression zone.
    pub zone2: PolynomialZone,
    /// First proportional zone (42 %).
    pub zone3: ProportionalZone,
    /// Top proportional zone ("Reichensteuer", 45 %).
    pub zone4: ProportionalZone,
    /// Entlastungsbetrag for single parents (tax class II).
    pub single_parent_relief: Decimal,
    /// Yearly allowance per full child (Kinderfreibetrag incl. BEA).
    pub child_allowance: Decimal,
    /// Arbeitnehmer-Pauschbetrag.
    pub employee_lump_sum: Decimal,
    /// Sonderausgaben-Pauschbetrag.
    pub special_expenses_lump_sum: Decimal,
}

/// Solidarity surcharge parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidarityRates {
    /// Full surcharge rate.
    pub rate: Decimal,
    /// Income tax amount below which no surcharge is due (single assessment).
    pub allowance: Decimal,
    /// Marginal rate within the mitigation band.
    pub mitigation_rate: Decimal,
}

/// Church tax rates by federal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurchTaxRates {
    /// Rate for states not listed in `state_rates`.
    pub default_rate: Decimal,
    /// Rates keyed by state code (e.g. "BY").
    #[serde(default)]
    pub state_rates: HashMap<String, Decimal>,
}

impl ChurchTaxRates {
    /// Returns the church tax rate for a state, falling back to the default.
    pub fn rate_for(&self, state: &str) -> Decimal {
        self.state_rates
            .get(&state.to_uppercase())
            .copied()
            .unwrap_or(self.default_rate)
    }
}

/// Construction industry rates (Baugewerbe).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionRates {
    /// Winter allowance per winter hour (tax-free).
    pub winter_allowance_per_hour: Decimal,
    /// Dirty-work allowance per hour (taxable).
    pub dirty_work_allowance_per_hour: Decimal,
    /// Night premium as a fraction of the hourly wage.
    pub night_premium_rate: Decimal,
    /// Sunday premium as a fraction of the hourly wage.
    pub sunday_premium_rate: Decimal,
    /// Holiday premium as a fraction of the hourly wage.
    pub holiday_premium_rate: Decimal,
    /// SOKA-BAU employer levy on construction gross wages.
    pub soka_bau_rate: Decimal,
}

/// Gastronomy rates: official per-meal benefit-in-kind values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GastronomyRates {
    /// Value of one breakfast.
    pub breakfast_value: Decimal,
    /// Value of one lunch.
    pub lunch_value: Decimal,
    /// Value of one dinner.
    pub dinner_value: Decimal,
}

/// Statutory tax-free ceilings for SFN premiums (§3b EStG).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NursingRates {
    /// Tax-free ceiling for night work.
    pub tax_free_night_rate: Decimal,
    /// Tax-free ceiling for Sunday work.
    pub tax_free_sunday_rate: Decimal,
    /// Tax-free ceiling for holiday work.
    pub tax_free_holiday_rate: Decimal,
    /// Hourly base wage above which premiums are no longer tax-free.
    pub tax_free_base_wage_cap: Decimal,
}

/// Industry section of the rate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryRates {
    /// Construction rates.
    pub construction: ConstructionRates,
    /// Gastronomy rates.
    pub gastronomy: GastronomyRates,
    /// Nursing rates.
    pub nursing: NursingRates,
}

/// All statutory constants for one calendar year.
///
/// A `RateTable` is pure data. It is loaded once and passed by reference
/// into every calculator call; nothing in the engine mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    /// The calendar year these constants apply to.
    pub year: i32,
    /// Social insurance rates and caps.
    pub social_insurance: SocialInsuranceRates,
    /// Minijob/Midijob parameters.
    pub low_income: LowIncomeRates,
    /// Progressive income tax.
    pub income_tax: IncomeTaxRates,
    /// Solidarity surcharge.
    pub solidarity: SolidarityRates,
    /// Church tax.
    pub church_tax: ChurchTaxRates,
    /// Statutory minimum wage per hour.
    pub minimum_wage: Decimal,
    /// Industry-specific rates.
    pub industry: IndustryRates,
}
