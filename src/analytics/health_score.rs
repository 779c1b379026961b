//! Payroll health score.

use crate::models::{AnomalySeverity, PayrollAnomaly};

/// Score of a payroll without open anomalies.
pub const MAX_HEALTH_SCORE: u32 = 100;

/// Points deducted per open anomaly of a severity.
pub fn severity_weight(severity: AnomalySeverity) -> u32 {
    match severity {
        AnomalySeverity::Critical => 25,
        AnomalySeverity::High => 15,
        AnomalySeverity::Medium => 8,
        AnomalySeverity::Low => 3,
    }
}

/// Scores payroll health from 0 to 100.
///
/// Each open anomaly deducts its severity weight from 100; resolved and
/// dismissed anomalies do not count. The score never drops below 0.
///
/// # Examples
///
/// ```
/// use lohnwerk::analytics::calculate_health_score;
///
/// assert_eq!(calculate_health_score(&[]), 100);
/// ```
pub fn calculate_health_score(anomalies: &[PayrollAnomaly]) -> u32 {
    let deduction: u32 = anomalies
        .iter()
        .filter(|a| a.is_open())
        .map(|a| severity_weight(a.severity))
        .sum();
    MAX_HEALTH_SCORE.saturating_sub(deduction)
}
