//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate for
//! the structural failures that abort a calculation: invalid input and
//! unsupported configuration. Compliance findings and advisory warnings are
//! not errors; they are returned as data (see
//! [`ComplianceWarning`](crate::models::ComplianceWarning) and
//! [`AdvisoryWarning`](crate::models::AdvisoryWarning)).

use rust_decimal::Decimal;
use thiserror::Error;

/// The main error type for the payroll engine.
///
/// # Example
///
/// ```
/// use lohnwerk::error::EngineError;
///
/// let error = EngineError::UnsupportedTaxYear { year: 2019 };
/// assert_eq!(error.to_string(), "Unsupported tax year: 2019");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rate table file or directory was not found.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Rate table file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Taxable income passed to the tax calculator was negative.
    #[error("Invalid taxable income: {value} (must not be negative)")]
    InvalidIncome {
        /// The rejected income.
        value: Decimal,
    },

    /// Gross salary passed to the social insurance calculator was negative.
    #[error("Invalid gross salary: {value} (must not be negative)")]
    InvalidSalary {
        /// The rejected salary.
        value: Decimal,
    },

    /// A monetary or time value was negative or out of range.
    #[error("Invalid input field '{field}': {message}")]
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// The employment type is not one of minijob, midijob, fulltime, parttime.
    #[error("Unsupported employment type: {value}")]
    UnsupportedEmploymentType {
        /// The unrecognized employment type.
        value: String,
    },

    /// The industry is not one of standard, construction, gastronomy, nursing.
    #[error("Unsupported industry: {value}")]
    UnsupportedIndustry {
        /// The unrecognized industry.
        value: String,
    },

    /// No rate table exists for the requested year.
    #[error("Unsupported tax year: {year}")]
    UnsupportedTaxYear {
        /// The requested year.
        year: i32,
    },

    /// Inputs that do not fit together, e.g. nursing input for a construction employee.
    #[error("Unsupported configuration: {message}")]
    UnsupportedConfiguration {
        /// A description of the mismatch.
        message: String,
    },

    /// An anomaly was moved out of a terminal state.
    #[error("Invalid anomaly transition for '{anomaly_id}': {from} -> {to}")]
    InvalidAnomalyTransition {
        /// The anomaly id.
        anomaly_id: String,
        /// The current status.
        from: String,
        /// The requested status.
        to: String,
    },

    /// The anomaly was not found in the repository.
    #[error("Anomaly not found: {anomaly_id}")]
    AnomalyNotFound {
        /// The anomaly id.
        anomaly_id: String,
    },
}

impl EngineError {
    /// Shorthand for [`EngineError::InvalidInput`].
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
