//! Non-fatal findings produced during calculation.
//!
//! Advisory warnings come from the industry modules, compliance warnings from
//! the minimum-wage and working-time checks. Neither aborts a calculation.

use serde::{Deserialize, Serialize};

/// Severity of a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    /// Informational.
    Low,
    /// Should be reviewed.
    Medium,
    /// Likely needs correction.
    High,
}

/// An industry-module edge case, e.g. winter hours outside the winter window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description.
    pub message: String,
    /// Severity level.
    pub severity: WarningSeverity,
}

impl AdvisoryWarning {
    /// Creates a new advisory warning.
    pub fn new(code: &str, message: impl Into<String>, severity: WarningSeverity) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity,
        }
    }
}

/// A minimum-wage or working-time violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceWarning {
    /// A code identifying the rule that was violated.
    pub code: String,
    /// A human-readable description.
    pub message: String,
    /// Severity level.
    pub severity: WarningSeverity,
}

impl ComplianceWarning {
    /// Creates a new compliance warning.
    pub fn new(code: &str, message: impl Into<String>, severity: WarningSeverity) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity,
        }
    }
}
