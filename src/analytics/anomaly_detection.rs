//! Anomaly detection over payroll entries.
//!
//! New entries are compared against the employee's history. Detection is a
//! pure function: the caller supplies history and the currently open
//! anomalies, and receives only the anomalies that are new.
//!
//! At most one open anomaly exists per `(type, employee)`: a detection that
//! matches an open anomaly, or an earlier detection in the same batch, is
//! suppressed.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::calculation::{SalaryInput, calculate_salary, period_end};
use crate::config::RateRegistry;
use crate::models::{
    AnomalySeverity, AnomalyStatus, AnomalyType, Employee, HistoricalPayrollData,
    PayrollAnomaly, PayrollEntry, PayrollPeriod,
};

fn default_salary_deviation_threshold() -> Decimal {
    Decimal::new(20, 2)
}

fn default_overtime_threshold() -> Decimal {
    Decimal::from(20)
}

fn default_bonus_threshold() -> Decimal {
    Decimal::from(5000)
}

fn default_min_data_points() -> usize {
    3
}

fn default_tolerance() -> Decimal {
    Decimal::ONE
}

/// Thresholds for anomaly detection.
///
/// Every field has a default, so an empty JSON or YAML object is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyDetectionConfig {
    /// Relative gross change above which a spike or drop is raised.
    #[serde(default = "default_salary_deviation_threshold")]
    pub salary_deviation_threshold: Decimal,
    /// Monthly overtime hours above which overtime is excessive.
    #[serde(default = "default_overtime_threshold")]
    pub overtime_threshold: Decimal,
    /// Bonus amount above which a bonus is unusual.
    #[serde(default = "default_bonus_threshold")]
    pub bonus_threshold: Decimal,
    /// Earlier periods required before salary changes are assessed.
    #[serde(default = "default_min_data_points")]
    pub min_data_points: usize,
    /// Allowed difference between withheld and recomputed income tax (EUR).
    #[serde(default = "default_tolerance")]
    pub tax_tolerance: Decimal,
    /// Allowed difference between withheld and recomputed contributions (EUR).
    #[serde(default = "default_tolerance")]
    pub sv_tolerance: Decimal,
}

impl Default for AnomalyDetectionConfig {
    fn default() -> Self {
        Self {
            salary_deviation_threshold: default_salary_deviation_threshold(),
            overtime_threshold: default_overtime_threshold(),
            bonus_threshold: default_bonus_threshold(),
            min_data_points: default_min_data_points(),
            tax_tolerance: default_tolerance(),
            sv_tolerance: default_tolerance(),
        }
    }
}

/// Severity of a salary change relative to the threshold.
///
/// More than three times the threshold is critical, more than twice is high.
pub fn deviation_severity(deviation: Decimal, threshold: Decimal) -> AnomalySeverity {
    let magnitude = deviation.abs();
    if magnitude > threshold * Decimal::from(3) {
        AnomalySeverity::Critical
    } else if magnitude > threshold * Decimal::TWO {
        AnomalySeverity::High
    } else {
        AnomalySeverity::Medium
    }
}

fn excess_severity(value: Decimal, threshold: Decimal) -> AnomalySeverity {
    if value > threshold * Decimal::TWO {
        AnomalySeverity::High
    } else {
        AnomalySeverity::Medium
    }
}

/// Collects new anomalies, suppressing duplicates of open ones.
struct AnomalyBatch {
    open: HashSet<(AnomalyType, String)>,
    anomalies: Vec<PayrollAnomaly>,
    detected_at: DateTime<Utc>,
}

struct Finding {
    anomaly_type: AnomalyType,
    severity: AnomalySeverity,
    current_value: Decimal,
    expected_value: Option<Decimal>,
    deviation: Option<Decimal>,
    message: String,
}

impl AnomalyBatch {
    fn new(open_anomalies: &[PayrollAnomaly], detected_at: DateTime<Utc>) -> Self {
        let open = open_anomalies
            .iter()
            .filter(|a| a.is_open())
            .map(|a| (a.anomaly_type, a.employee_id.clone()))
            .collect();
        Self {
            open,
            anomalies: Vec::new(),
            detected_at,
        }
    }

    fn raise(&mut self, employee_id: &str, period: PayrollPeriod, finding: Finding) {
        if !self
            .open
            .insert((finding.anomaly_type, employee_id.to_string()))
        {
            debug!(
                employee_id,
                anomaly_type = %finding.anomaly_type,
                "Suppressed anomaly already open"
            );
            return;
        }
        warn!(
            employee_id,
            period = %period,
            anomaly_type = %finding.anomaly_type,
            severity = ?finding.severity,
            message = %finding.message,
            "Payroll anomaly detected"
        );
        self.anomalies.push(PayrollAnomaly {
            id: Uuid::new_v4(),
            anomaly_type: finding.anomaly_type,
            severity: finding.severity,
            employee_id: employee_id.to_string(),
            current_value: finding.current_value,
            expected_value: finding.expected_value,
            deviation: finding.deviation,
            detected_at: self.detected_at,
            period,
            status: AnomalyStatus::Detected,
            message: finding.message,
            closed_at: None,
        });
    }
}

/// Detects anomalies in newly computed payroll entries.
///
/// - Salary spike/drop: `|Δgross| / previous gross` strictly above the
///   threshold, where previous is the employee's most recent earlier period.
///   Requires at least `min_data_points` earlier periods.
/// - Excessive overtime and unusual bonus: strictly above the threshold.
/// - Missing entry: months without an entry between the employee's first
///   known period and the latest scanned period, and employees without any
///   entry.
/// - Duplicate entry: a new entry for a period that already has one.
/// - Tax and SV discrepancy: withheld amounts differ from amounts recomputed
///   from the entry's gross by more than the tolerance.
///
/// `history` holds previously persisted periods and must not contain the new
/// entries themselves. Entries for years without a rate table skip the
/// discrepancy checks.
pub fn detect_anomalies(
    employees: &[Employee],
    new_entries: &[PayrollEntry],
    history: &[HistoricalPayrollData],
    open_anomalies: &[PayrollAnomaly],
    rates: &RateRegistry,
    config: &AnomalyDetectionConfig,
    detected_at: DateTime<Utc>,
) -> Vec<PayrollAnomaly> {
    let mut batch = AnomalyBatch::new(open_anomalies, detected_at);
    let employees_by_id: HashMap<&str, &Employee> =
        employees.iter().map(|e| (e.id.as_str(), e)).collect();

    let mut entries: Vec<&PayrollEntry> = new_entries.iter().collect();
    entries.sort_by(|a, b| (&a.employee_id, a.period).cmp(&(&b.employee_id, b.period)));

    // Per-employee timeline of gross salaries: history first, then new entries.
    let mut timelines: HashMap<&str, BTreeMap<PayrollPeriod, Decimal>> = HashMap::new();
    for record in history {
        timelines
            .entry(record.employee_id.as_str())
            .or_default()
            .insert(record.period, record.gross_salary);
    }

    let mut seen: HashSet<(&str, PayrollPeriod)> = history
        .iter()
        .map(|r| (r.employee_id.as_str(), r.period))
        .collect();
    for entry in &entries {
        if !seen.insert((entry.employee_id.as_str(), entry.period)) {
            batch.raise(
                &entry.employee_id,
                entry.period,
                Finding {
                    anomaly_type: AnomalyType::DuplicateEntry,
                    severity: AnomalySeverity::High,
                    current_value: entry.salary.gross_salary,
                    expected_value: None,
                    deviation: None,
                    message: format!(
                        "More than one payroll entry for {} in {}",
                        entry.employee_id, entry.period
                    ),
                },
            );
        }
    }
    for entry in &entries {
        timelines
            .entry(entry.employee_id.as_str())
            .or_default()
            .entry(entry.period)
            .or_insert(entry.salary.gross_salary);
    }

    for entry in &entries {
        let timeline = timelines.get(entry.employee_id.as_str());
        check_salary_change(&mut batch, entry, timeline, config);
        check_thresholds(&mut batch, entry, config);
        if let Some(employee) = employees_by_id.get(entry.employee_id.as_str()) {
            check_discrepancies(&mut batch, entry, employee, rates, config);
        }
    }

    if let Some(latest) = entries.iter().map(|e| e.period).max() {
        check_missing_entries(&mut batch, employees, &timelines, latest);
    }

    debug!(
        new_entries = new_entries.len(),
        history = history.len(),
        detected = batch.anomalies.len(),
        "Anomaly detection finished"
    );
    batch.anomalies
}

fn check_salary_change(
    batch: &mut AnomalyBatch,
    entry: &PayrollEntry,
    timeline: Option<&BTreeMap<PayrollPeriod, Decimal>>,
    config: &AnomalyDetectionConfig,
) {
    let Some(timeline) = timeline else {
        return;
    };
    let mut earlier = timeline.range(..entry.period);
    if earlier.clone().count() < config.min_data_points.max(1) {
        return;
    }
    let Some((_, &previous)) = earlier.next_back() else {
        return;
    };
    if previous <= Decimal::ZERO {
        return;
    }

    let current = entry.salary.gross_salary;
    let deviation = (current - previous) / previous;
    if deviation.abs() <= config.salary_deviation_threshold {
        return;
    }

    let (anomaly_type, direction) = if deviation > Decimal::ZERO {
        (AnomalyType::SalarySpike, "rose")
    } else {
        (AnomalyType::SalaryDrop, "fell")
    };
    batch.raise(
        &entry.employee_id,
        entry.period,
        Finding {
            anomaly_type,
            severity: deviation_severity(deviation, config.salary_deviation_threshold),
            current_value: current,
            expected_value: Some(previous),
            deviation: Some(deviation),
            message: format!(
                "Gross {} by {}% from {} to {}",
                direction,
                (deviation.abs() * Decimal::ONE_HUNDRED).round_dp(2),
                previous,
                current
            ),
        },
    );
}

fn check_thresholds(batch: &mut AnomalyBatch, entry: &PayrollEntry, config: &AnomalyDetectionConfig) {
    let overtime = entry.working_time.overtime_hours;
    if overtime > config.overtime_threshold {
        batch.raise(
            &entry.employee_id,
            entry.period,
            Finding {
                anomaly_type: AnomalyType::ExcessiveOvertime,
                severity: excess_severity(overtime, config.overtime_threshold),
                current_value: overtime,
                expected_value: Some(config.overtime_threshold),
                deviation: Some(overtime - config.overtime_threshold),
                message: format!(
                    "{}h overtime exceeds the limit of {}h",
                    overtime, config.overtime_threshold
                ),
            },
        );
    }

    let bonus = entry.additions.bonuses;
    if bonus > config.bonus_threshold {
        batch.raise(
            &entry.employee_id,
            entry.period,
            Finding {
                anomaly_type: AnomalyType::UnusualBonus,
                severity: excess_severity(bonus, config.bonus_threshold),
                current_value: bonus,
                expected_value: Some(config.bonus_threshold),
                deviation: Some(bonus - config.bonus_threshold),
                message: format!(
                    "Bonus of {} EUR exceeds the limit of {} EUR",
                    bonus, config.bonus_threshold
                ),
            },
        );
    }
}

fn check_discrepancies(
    batch: &mut AnomalyBatch,
    entry: &PayrollEntry,
    employee: &Employee,
    rates: &RateRegistry,
    config: &AnomalyDetectionConfig,
) {
    let Ok(table) = rates.get(entry.period.year) else {
        debug!(
            employee_id = %entry.employee_id,
            year = entry.period.year,
            "No rate table; skipping discrepancy checks"
        );
        return;
    };
    let Ok(end) = period_end(entry.period) else {
        return;
    };
    let industry_employer_costs = entry
        .industry
        .as_ref()
        .map(|i| i.employer_additional_costs)
        .unwrap_or_default();
    let expected = match calculate_salary(
        &SalaryInput {
            employee,
            age: employee.age_on(end),
            taxable_gross: entry.salary.gross_salary,
            tax_free_additions: entry.salary.tax_free_additions,
            industry_employer_costs,
        },
        table,
    ) {
        Ok(expected) => expected,
        Err(err) => {
            warn!(
                employee_id = %entry.employee_id,
                error = %err,
                "Could not recompute entry for discrepancy checks"
            );
            return;
        }
    };

    let withheld_tax = entry.salary.taxes.income_tax;
    let expected_tax = expected.taxes.income_tax;
    let tax_difference = withheld_tax - expected_tax;
    if tax_difference.abs() > config.tax_tolerance {
        batch.raise(
            &entry.employee_id,
            entry.period,
            Finding {
                anomaly_type: AnomalyType::TaxDiscrepancy,
                severity: AnomalySeverity::High,
                current_value: withheld_tax,
                expected_value: Some(expected_tax),
                deviation: Some(tax_difference),
                message: format!(
                    "Withheld income tax {} differs from expected {} by {}",
                    withheld_tax.round_dp(2),
                    expected_tax.round_dp(2),
                    tax_difference.round_dp(2)
                ),
            },
        );
    }

    let withheld_sv = entry.salary.social_security.totals.employee;
    let expected_sv = expected.social_security.totals.employee;
    let sv_difference = withheld_sv - expected_sv;
    if sv_difference.abs() > config.sv_tolerance {
        batch.raise(
            &entry.employee_id,
            entry.period,
            Finding {
                anomaly_type: AnomalyType::SvDiscrepancy,
                severity: AnomalySeverity::High,
                current_value: withheld_sv,
                expected_value: Some(expected_sv),
                deviation: Some(sv_difference),
                message: format!(
                    "Employee social insurance {} differs from expected {} by {}",
                    withheld_sv.round_dp(2),
                    expected_sv.round_dp(2),
                    sv_difference.round_dp(2)
                ),
            },
        );
    }
}

fn check_missing_entries(
    batch: &mut AnomalyBatch,
    employees: &[Employee],
    timelines: &HashMap<&str, BTreeMap<PayrollPeriod, Decimal>>,
    latest: PayrollPeriod,
) {
    for employee in employees {
        let Some(timeline) = timelines.get(employee.id.as_str()) else {
            batch.raise(
                &employee.id,
                latest,
                Finding {
                    anomaly_type: AnomalyType::MissingEntry,
                    severity: AnomalySeverity::High,
                    current_value: Decimal::ONE,
                    expected_value: None,
                    deviation: None,
                    message: format!("No payroll entry for {} up to {}", employee.id, latest),
                },
            );
            continue;
        };
        let Some(&first) = timeline.keys().next() else {
            continue;
        };

        let mut missing = Vec::new();
        let mut period = first;
        while period <= latest {
            if !timeline.contains_key(&period) {
                missing.push(period);
            }
            period = period.next();
        }

        if let Some(&first_missing) = missing.first() {
            let listed: Vec<String> = missing.iter().map(ToString::to_string).collect();
            batch.raise(
                &employee.id,
                first_missing,
                Finding {
                    anomaly_type: AnomalyType::MissingEntry,
                    severity: if missing.len() > 1 {
                        AnomalySeverity::High
                    } else {
                        AnomalySeverity::Medium
                    },
                    current_value: Decimal::from(missing.len()),
                    expected_value: None,
                    deviation: None,
                    message: format!("No payroll entry for {}", listed.join(", ")),
                },
            );
        }
    }
}
