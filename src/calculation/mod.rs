//! Calculation logic for the payroll engine.
//!
//! This module contains the progressive income tax with solidarity surcharge
//! and church tax, the social insurance calculator with its Minijob and
//! Midijob regimes, the industry surcharge modules, the compliance checks and
//! the gross-to-net orchestrator tying them together.
//!
//! All functions are pure: they take a [`RateTable`](crate::config::RateTable)
//! by reference and return values or an [`EngineError`](crate::error::EngineError).

mod compliance;
mod gross_to_net;
pub mod industry;
mod income_tax;
mod social_insurance;

pub use compliance::{
    MAX_DAILY_HOURS, MAX_DAILY_OVERTIME, MinimumWageCheck, OvertimeCheck, WORKING_DAYS_PER_WEEK,
    validate_minimum_wage, validate_overtime_compliance,
};
pub use gross_to_net::{
    PayrollInput, SalaryInput, annual_taxable_income, calculate_salary, compute, compute_batch,
    compute_entry, period_end, vorsorgepauschale,
};
pub use income_tax::{
    IncomeTaxResult, TaxInput, TaxZone, calculate_income_tax, income_tax_for_class,
    progressive_income_tax, solidarity_surcharge, tax_zone,
};
pub use industry::{
    IndustryContext, IndustryModule, IndustrySurchargeModule, calculate_industry_surcharges,
};
pub use social_insurance::{
    SocialInsuranceInput, calculate_social_insurance, contribution_regime, midijob_bases,
};
