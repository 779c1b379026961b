//! Social insurance contribution calculation.
//!
//! This module splits pension, unemployment, health and care insurance
//! contributions between employee and employer. Three regimes apply:
//!
//! - **Regular**: rates applied to the gross capped at the branch's BBG
//!   (pension/unemployment per region, health/care nationwide).
//! - **Minijob**: the employee pays nothing; the employer pays flat health and
//!   pension rates on the full gross.
//! - **Midijob**: in the transition band the contribution base is reduced by
//!   factor F and the employee's base separately, sliding from zero at the
//!   Minijob threshold to the full gross at the band's upper limit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ContributionRate, LowIncomeRates, RateTable};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    ContributionRegime, ContributionSplit, EmploymentType, Region, SocialSecurityContributions,
};

/// Inputs to the social insurance calculation for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialInsuranceInput {
    /// Monthly gross subject to contributions.
    pub gross_monthly: Decimal,
    /// Age of the employee at the end of the period.
    pub age: u32,
    /// Whether the employee has no children.
    pub childless: bool,
    /// Region for the pension/unemployment cap.
    pub region: Region,
    /// Employment type.
    pub employment_type: EmploymentType,
}

/// Determines which contribution regime applies.
///
/// A Minijob-typed employee above the threshold, and any employee whose gross
/// falls into the transition band, is treated as a Midijob.
pub fn contribution_regime(
    employment_type: EmploymentType,
    gross_monthly: Decimal,
    rates: &LowIncomeRates,
) -> ContributionRegime {
    if gross_monthly <= rates.minijob_threshold {
        if employment_type == EmploymentType::Minijob {
            return ContributionRegime::Minijob;
        }
        return ContributionRegime::Regular;
    }
    if gross_monthly <= rates.midijob_upper_limit {
        return ContributionRegime::Midijob;
    }
    ContributionRegime::Regular
}

fn split_on_base(base: Decimal, rate: &ContributionRate) -> ContributionSplit {
    ContributionSplit::new(base * rate.employee, base * rate.employer)
}

/// Returns the total and employee assessment bases in the transition band.
///
/// `total = F·G + (O/(O−G) − G/(O−G)·F)·(AE − G)` and
/// `employee = O/(O−G)·(AE − G)`, where G is the Minijob threshold, O the
/// band's upper limit and AE the gross.
pub fn midijob_bases(gross_monthly: Decimal, rates: &LowIncomeRates) -> (Decimal, Decimal) {
    let g = rates.minijob_threshold;
    let o = rates.midijob_upper_limit;
    let f = rates.midijob_factor;
    let band = o - g;
    let above = (gross_monthly - g).max(Decimal::ZERO);

    let total_base = f * g + (o / band - g / band * f) * above;
    let employee_base = o / band * above;
    (total_base, employee_base)
}

/// Calculates the monthly contributions for all four branches.
///
/// # Errors
///
/// Returns `InvalidSalary` for a negative gross.
///
/// # Examples
///
/// ```
/// use lohnwerk::calculation::{SocialInsuranceInput, calculate_social_insurance};
/// use lohnwerk::config::RateRegistry;
/// use lohnwerk::models::{EmploymentType, Region};
/// use rust_decimal::Decimal;
///
/// let registry = RateRegistry::builtin().unwrap();
/// let input = SocialInsuranceInput {
///     gross_monthly: Decimal::from(3500),
///     age: 30,
///     childless: true,
///     region: Region::West,
///     employment_type: EmploymentType::Fulltime,
/// };
/// let result = calculate_social_insurance(&input, registry.get(2025).unwrap()).unwrap();
/// assert_eq!(result.totals.employee, Decimal::new(75425, 2));
/// ```
pub fn calculate_social_insurance(
    input: &SocialInsuranceInput,
    table: &RateTable,
) -> EngineResult<SocialSecurityContributions> {
    if input.gross_monthly < Decimal::ZERO {
        return Err(EngineError::InvalidSalary {
            value: input.gross_monthly,
        });
    }

    let si = &table.social_insurance;
    let health_rate = si.health.as_contribution_rate();
    let care_rate = if input.childless && input.age > si.care_childless_min_age {
        si.care_childless
    } else {
        si.care
    };

    let regime = contribution_regime(input.employment_type, input.gross_monthly, &table.low_income);
    let gross = input.gross_monthly;

    let contributions = match regime {
        ContributionRegime::Minijob => {
            let low = &table.low_income;
            SocialSecurityContributions::new(
                regime,
                ContributionSplit::new(Decimal::ZERO, gross * low.minijob_employer_pension_rate),
                ContributionSplit::zero(),
                ContributionSplit::new(Decimal::ZERO, gross * low.minijob_employer_health_rate),
                ContributionSplit::zero(),
            )
        }
        ContributionRegime::Midijob => {
            let (total_base, employee_base) = midijob_bases(gross, &table.low_income);
            let split = |rate: &ContributionRate| {
                ContributionSplit::from_total(total_base * rate.total, employee_base * rate.employee)
            };
            SocialSecurityContributions::new(
                regime,
                split(&si.pension),
                split(&si.unemployment),
                split(&health_rate),
                split(&care_rate),
            )
        }
        ContributionRegime::Regular => {
            let pension_base = gross.min(si.bbg.pension_monthly(input.region));
            let health_base = gross.min(si.bbg.health_monthly);
            SocialSecurityContributions::new(
                regime,
                split_on_base(pension_base, &si.pension),
                split_on_base(pension_base, &si.unemployment),
                split_on_base(health_base, &health_rate),
                split_on_base(health_base, &care_rate),
            )
        }
    };

    debug!(
        gross = %gross,
        ?regime,
        employee = %contributions.totals.employee,
        employer = %contributions.totals.employer,
        "Calculated social insurance"
    );

    Ok(contributions)
}
