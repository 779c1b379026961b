//! Core data models for the payroll engine.
//!
//! This module contains all the domain models used throughout the engine.
//! They are immutable value records produced per invocation; persisting them
//! is the caller's concern.

mod anomaly;
mod employee;
mod industry;
mod payroll_entry;
mod salary;
mod warnings;
mod working_time;

pub use anomaly::{
    AnomalySeverity, AnomalyStatus, AnomalyType, ForecastMethod, ForecastPoint, PayrollAnomaly,
    SalaryForecast,
};
pub use employee::{Employee, EmploymentType, Region, TaxClass, WEEKS_PER_MONTH};
pub use industry::{
    ConstructionBreakdown, ConstructionConfig, ConstructionInput, GastronomyBreakdown,
    GastronomyConfig, GastronomyInput, IndustryBreakdown, IndustryConfig, IndustryPayrollInput,
    IndustryPayrollResult, IndustryType, NursingBreakdown, NursingConfig, NursingInput,
    ShiftRecord,
};
pub use payroll_entry::{
    Additions, AuditStep, AuditTrace, Deductions, HistoricalPayrollData, PayrollEntry,
};
pub use salary::{
    ContributionRegime, ContributionSplit, EmployerCosts, SalaryCalculation,
    SocialSecurityContributions, TaxBreakdown,
};
pub use warnings::{AdvisoryWarning, ComplianceWarning, WarningSeverity};
pub use working_time::{PayrollPeriod, WORKING_DAY_TOLERANCE, WorkingTimeData};
