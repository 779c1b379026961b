//! Salary calculation result models.
//!
//! This module contains the [`SalaryCalculation`] produced by the gross-to-net
//! orchestrator and its structured parts: per-branch social insurance splits,
//! the tax breakdown and employer costs.

use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount split between employee and employer.
///
/// `total` always equals `employee + employer`.
///
/// # Example
///
/// ```
/// use lohnwerk::models::ContributionSplit;
/// use rust_decimal::Decimal;
///
/// let split = ContributionSplit::new(Decimal::new(32550, 2), Decimal::new(32550, 2));
/// assert_eq!(split.total, Decimal::new(65100, 2));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionSplit {
    /// The employee's share.
    pub employee: Decimal,
    /// The employer's share.
    pub employer: Decimal,
    /// The combined amount.
    pub total: Decimal,
}

impl ContributionSplit {
    /// Creates a split from the two shares.
    pub fn new(employee: Decimal, employer: Decimal) -> Self {
        Self {
            employee,
            employer,
            total: employee + employer,
        }
    }

    /// Creates a split from the total and the employee share; the employer
    /// carries the remainder.
    pub fn from_total(total: Decimal, employee: Decimal) -> Self {
        Self {
            employee,
            employer: total - employee,
            total,
        }
    }

    /// A split with all shares zero.
    pub fn zero() -> Self {
        Self::default()
    }
}

impl Add for ContributionSplit {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.employee + rhs.employee, self.employer + rhs.employer)
    }
}

impl Sum for ContributionSplit {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

/// Which contribution regime applied to a salary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionRegime {
    /// Standard employee/employer split on the capped base.
    Regular,
    /// Employer-only flat contributions.
    Minijob,
    /// Reduced assessment base in the transition band.
    Midijob,
}

/// Monthly social insurance contributions for all four branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialSecurityContributions {
    /// The regime that was applied.
    pub regime: ContributionRegime,
    /// Pension insurance.
    pub pension: ContributionSplit,
    /// Unemployment insurance.
    pub unemployment: ContributionSplit,
    /// Health insurance.
    pub health: ContributionSplit,
    /// Care insurance.
    pub care: ContributionSplit,
    /// Sum over all branches.
    pub totals: ContributionSplit,
}

impl SocialSecurityContributions {
    /// Builds the contribution set and its totals.
    pub fn new(
        regime: ContributionRegime,
        pension: ContributionSplit,
        unemployment: ContributionSplit,
        health: ContributionSplit,
        care: ContributionSplit,
    ) -> Self {
        let totals: ContributionSplit = [pension, unemployment, health, care].into_iter().sum();
        Self {
            regime,
            pension,
            unemployment,
            health,
            care,
            totals,
        }
    }

    /// Iterates the branches with their names.
    pub fn branches(&self) -> [(&'static str, ContributionSplit); 4] {
        [
            ("pension", self.pension),
            ("unemployment", self.unemployment),
            ("health", self.health),
            ("care", self.care),
        ]
    }
}

/// Income tax, solidarity surcharge and church tax.
///
/// `total` is the employee-borne sum of `income_tax`, `solidarity_tax` and
/// `church_tax`. `employer_flat_tax` is the Minijob flat payroll tax, which
/// the employer pays and which is not part of `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    /// Progressive income tax (Lohnsteuer).
    pub income_tax: Decimal,
    /// Solidarity surcharge.
    pub solidarity_tax: Decimal,
    /// Church tax.
    pub church_tax: Decimal,
    /// Employer-paid flat tax (Minijob).
    pub employer_flat_tax: Decimal,
    /// Employee-borne total.
    pub total: Decimal,
}

impl TaxBreakdown {
    /// Creates an employee-borne breakdown.
    pub fn new(income_tax: Decimal, solidarity_tax: Decimal, church_tax: Decimal) -> Self {
        Self {
            income_tax,
            solidarity_tax,
            church_tax,
            employer_flat_tax: Decimal::ZERO,
            total: income_tax + solidarity_tax + church_tax,
        }
    }

    /// Creates an employer-only flat tax breakdown.
    pub fn employer_flat(amount: Decimal) -> Self {
        Self {
            employer_flat_tax: amount,
            ..Self::default()
        }
    }

    /// Returns every figure divided by `divisor` (e.g. 12 to de-annualize).
    pub fn divided_by(&self, divisor: Decimal) -> Self {
        Self {
            income_tax: self.income_tax / divisor,
            solidarity_tax: self.solidarity_tax / divisor,
            church_tax: self.church_tax / divisor,
            employer_flat_tax: self.employer_flat_tax / divisor,
            total: self.total / divisor,
        }
    }

    /// Returns every figure multiplied by `factor`.
    pub fn multiplied_by(&self, factor: Decimal) -> Self {
        Self {
            income_tax: self.income_tax * factor,
            solidarity_tax: self.solidarity_tax * factor,
            church_tax: self.church_tax * factor,
            employer_flat_tax: self.employer_flat_tax * factor,
            total: self.total * factor,
        }
    }
}

/// What the employee costs the employer for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployerCosts {
    /// Taxable gross salary.
    pub gross_salary: Decimal,
    /// Tax-free additions paid on top.
    pub tax_free_additions: Decimal,
    /// Employer's social insurance share.
    pub social_security: Decimal,
    /// Employer-paid flat tax.
    pub flat_rate_tax: Decimal,
    /// Industry levies (e.g. SOKA-BAU).
    pub industry_additional_costs: Decimal,
    /// Sum of all employer costs.
    pub total: Decimal,
}

impl EmployerCosts {
    /// Builds the cost record and its total.
    pub fn new(
        gross_salary: Decimal,
        tax_free_additions: Decimal,
        social_security: Decimal,
        flat_rate_tax: Decimal,
        industry_additional_costs: Decimal,
    ) -> Self {
        Self {
            gross_salary,
            tax_free_additions,
            social_security,
            flat_rate_tax,
            industry_additional_costs,
            total: gross_salary
                + tax_free_additions
                + social_security
                + flat_rate_tax
                + industry_additional_costs,
        }
    }
}

/// The monthly gross-to-net result for one employee.
///
/// `gross_salary` is the taxable gross. Tax-free additions are carried in
/// `tax_free_additions` and paid on top, so
/// `net_salary = gross_salary − social_security.totals.employee − taxes.total
/// + tax_free_additions`. Figures are unrounded; only the final net of a
/// [`PayrollEntry`](super::PayrollEntry) is rounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryCalculation {
    /// Taxable monthly gross.
    pub gross_salary: Decimal,
    /// Tax-free monthly additions.
    pub tax_free_additions: Decimal,
    /// `gross_salary + tax_free_additions`.
    pub total_gross: Decimal,
    /// Net before period deductions.
    pub net_salary: Decimal,
    /// Social insurance contributions.
    pub social_security: SocialSecurityContributions,
    /// Monthly taxes.
    pub taxes: TaxBreakdown,
    /// Yearly taxes the monthly figures were derived from.
    pub annual_taxes: TaxBreakdown,
    /// Yearly taxable income (zvE) the tax was computed on.
    pub taxable_income: Decimal,
    /// Employer costs.
    pub employer_costs: EmployerCosts,
}
