//! Anomaly and forecast models.
//!
//! A [`PayrollAnomaly`] moves through `detected → resolved | dismissed`; both
//! end states are terminal. Transitions return a new value rather than
//! mutating in place.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::PayrollPeriod;

/// The kind of irregularity an anomaly describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnomalyType {
    /// Gross rose by more than the deviation threshold.
    SalarySpike,
    /// Gross fell by more than the deviation threshold.
    SalaryDrop,
    /// Overtime above the configured limit.
    ExcessiveOvertime,
    /// Bonus above the configured limit.
    UnusualBonus,
    /// An expected period has no entry.
    MissingEntry,
    /// Two entries for the same period.
    DuplicateEntry,
    /// Withheld tax differs from the recomputed amount.
    TaxDiscrepancy,
    /// Social insurance differs from the recomputed amount.
    SvDiscrepancy,
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SalarySpike => "salary-spike",
            Self::SalaryDrop => "salary-drop",
            Self::ExcessiveOvertime => "excessive-overtime",
            Self::UnusualBonus => "unusual-bonus",
            Self::MissingEntry => "missing-entry",
            Self::DuplicateEntry => "duplicate-entry",
            Self::TaxDiscrepancy => "tax-discrepancy",
            Self::SvDiscrepancy => "sv-discrepancy",
        };
        write!(f, "{}", s)
    }
}

/// How serious an anomaly is. Orders `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalySeverity {
    /// Informational.
    Low,
    /// Worth a look.
    Medium,
    /// Needs review before payout.
    High,
    /// Blocks payout.
    Critical,
}

/// Lifecycle state of an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyStatus {
    /// Open.
    Detected,
    /// Fixed by an operator.
    Resolved,
    /// Accepted as not an issue.
    Dismissed,
}

impl fmt::Display for AnomalyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Detected => "detected",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
        };
        write!(f, "{}", s)
    }
}

/// An irregularity found by an anomaly scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollAnomaly {
    /// Unique identifier.
    pub id: Uuid,
    /// Kind of anomaly.
    #[serde(rename = "type")]
    pub anomaly_type: AnomalyType,
    /// Severity.
    pub severity: AnomalySeverity,
    /// The affected employee.
    pub employee_id: String,
    /// The observed value.
    pub current_value: Decimal,
    /// The value the scan expected, if any.
    pub expected_value: Option<Decimal>,
    /// Relative or absolute deviation, if any.
    pub deviation: Option<Decimal>,
    /// When the scan found it.
    pub detected_at: DateTime<Utc>,
    /// The affected period.
    pub period: PayrollPeriod,
    /// Lifecycle state.
    pub status: AnomalyStatus,
    /// Human-readable description.
    pub message: String,
    /// When the anomaly left the detected state.
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

impl PayrollAnomaly {
    /// Returns true while the anomaly is still open.
    pub fn is_open(&self) -> bool {
        self.status == AnomalyStatus::Detected
    }

    /// Returns true if an operator resolved the anomaly.
    pub fn is_resolved(&self) -> bool {
        self.status == AnomalyStatus::Resolved
    }

    /// Marks the anomaly resolved.
    pub fn resolve(self, at: DateTime<Utc>) -> EngineResult<Self> {
        self.transition(AnomalyStatus::Resolved, at)
    }

    /// Marks the anomaly dismissed.
    pub fn dismiss(self, at: DateTime<Utc>) -> EngineResult<Self> {
        self.transition(AnomalyStatus::Dismissed, at)
    }

    /// Relabels the severity of an open anomaly.
    pub fn with_severity(self, severity: AnomalySeverity) -> EngineResult<Self> {
        if !self.is_open() {
            return Err(self.invalid_transition("relabel"));
        }
        Ok(Self { severity, ..self })
    }

    fn transition(self, to: AnomalyStatus, at: DateTime<Utc>) -> EngineResult<Self> {
        if !self.is_open() {
            return Err(self.invalid_transition(&to.to_string()));
        }
        Ok(Self {
            status: to,
            closed_at: Some(at),
            ..self
        })
    }

    fn invalid_transition(&self, to: &str) -> EngineError {
        EngineError::InvalidAnomalyTransition {
            anomaly_id: self.id.to_string(),
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}

/// How a forecast extrapolates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    /// `base × (1 + g × m/12)`.
    Linear,
    /// `base × (1 + g)^(m/12)`.
    #[default]
    Compound,
}

/// One projected month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// The projected period.
    pub period: PayrollPeriod,
    /// Projected gross, rounded to cents.
    pub projected_gross: Decimal,
    /// Projected net, rounded to cents.
    pub projected_net: Decimal,
}

/// A salary projection for one employee.
///
/// `confidence` grows with the number of history points; it is not derived
/// from the variance of the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryForecast {
    /// The employee.
    pub employee_id: String,
    /// Extrapolation method.
    pub method: ForecastMethod,
    /// Assumed annual growth.
    pub annual_growth_rate: Decimal,
    /// Gross of the latest history period.
    pub base_gross: Decimal,
    /// Average observed net/gross ratio.
    pub net_ratio: Decimal,
    /// Projected months.
    pub points: Vec<ForecastPoint>,
    /// Confidence in [0, 1].
    pub confidence: Decimal,
    /// Number of history points used.
    pub data_points: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_anomaly() -> PayrollAnomaly {
        PayrollAnomaly {
            id: Uuid::new_v4(),
            anomaly_type: AnomalyType::SalarySpike,
            severity: AnomalySeverity::Medium,
            employee_id: "emp_001".to_string(),
            current_value: Decimal::from(4000),
            expected_value: Some(Decimal::from(3000)),
            deviation: Some(Decimal::new(3333, 4)),
            detected_at: Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap(),
            period: PayrollPeriod::new(2025, 3).unwrap(),
            status: AnomalyStatus::Detected,
            message: "Gross rose by 33.33%".to_string(),
            closed_at: None,
        }
    }

    #[test]
    fn test_resolve_open_anomaly() {
        let at = Utc.with_ymd_and_hms(2025, 4, 2, 9, 0, 0).unwrap();
        let resolved = sample_anomaly().resolve(at).unwrap();
        assert!(resolved.is_resolved());
        assert!(!resolved.is_open());
        assert_eq!(resolved.closed_at, Some(at));
    }

    #[test]
    fn test_dismissed_is_terminal() {
        let at = Utc.with_ymd_and_hms(2025, 4, 2, 9, 0, 0).unwrap();
        let dismissed = sample_anomaly().dismiss(at).unwrap();
        assert!(!dismissed.is_resolved());

        match dismissed.clone().resolve(at) {
            Err(EngineError::InvalidAnomalyTransition { from, to, .. }) => {
                assert_eq!(from, "dismissed");
                assert_eq!(to, "resolved");
            }
            other => panic!("Expected InvalidAnomalyTransition, got {:?}", other),
        }
        assert!(dismissed.with_severity(AnomalySeverity::High).is_err());
    }

    #[test]
    fn test_relabel_open_anomaly() {
        let relabeled = sample_anomaly()
            .with_severity(AnomalySeverity::Critical)
            .unwrap();
        assert_eq!(relabeled.severity, AnomalySeverity::Critical);
        assert!(relabeled.is_open());
    }

    #[test]
    fn test_anomaly_type_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&AnomalyType::SvDiscrepancy).unwrap(),
            "\"sv-discrepancy\""
        );
        let json = serde_json::to_value(sample_anomaly()).unwrap();
        assert_eq!(json["type"], "salary-spike");
        assert_eq!(json["status"], "detected");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(AnomalySeverity::Critical > AnomalySeverity::High);
        assert!(AnomalySeverity::High > AnomalySeverity::Medium);
        assert!(AnomalySeverity::Medium > AnomalySeverity::Low);
    }
}
