//! Rate tables for the payroll engine.
//!
//! This module provides the versioned statutory constants (contribution
//! rates, assessment-base caps, tax zones, minimum wage, industry rates) as
//! one [`RateTable`] per calendar year, loaded from YAML into a
//! [`RateRegistry`].
//!
//! # Example
//!
//! ```no_run
//! use lohnwerk::config::RateRegistry;
//!
//! let registry = RateRegistry::load("./config/rates").unwrap();
//! println!("Supported years: {:?}", registry.years());
//! ```

mod loader;
mod types;

pub use loader::RateRegistry;
pub use types::{
    AssessmentCaps, ChurchTaxRates, ConstructionRates, ContributionRate, GastronomyRates,
    HealthRates, IncomeTaxRates, IndustryRates, LowIncomeRates, NursingRates, PolynomialZone,
    ProportionalZone, RateTable, SocialInsuranceRates, SolidarityRates,
};
