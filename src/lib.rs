//! Deterministic German payroll engine
//!
//! This crate turns a monthly gross salary into net pay following the German
//! income tax tariff (§32a EStG) and the statutory social insurance rules. It
//! adds industry surcharges for construction, gastronomy and nursing, checks
//! minimum wage and working time limits, and analyses payroll history for
//! anomalies. Yearly rates live in YAML rate tables under `config/rates`.

#![warn(missing_docs)]

pub mod analytics;
pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
