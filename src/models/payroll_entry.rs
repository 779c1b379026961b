//! Payroll entry models.
//!
//! This module contains the [`PayrollEntry`] produced once per employee and
//! period, the [`Additions`] and [`Deductions`] that feed into it, the audit
//! trace recording every calculation step, and the compact
//! [`HistoricalPayrollData`] projection consumed by the anomaly engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    AdvisoryWarning, IndustryPayrollResult, PayrollPeriod, SalaryCalculation, WorkingTimeData,
};

/// Explicit additions to the monthly gross.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Additions {
    /// Performance or retention bonuses.
    pub bonuses: Decimal,
    /// Overtime premiums.
    pub overtime_premiums: Decimal,
    /// One-time payments (e.g. holiday or Christmas pay).
    pub one_time_payments: Decimal,
    /// Other taxable additions.
    pub other: Decimal,
}

impl Additions {
    /// Sum of all additions.
    pub fn total(&self) -> Decimal {
        self.bonuses + self.overtime_premiums + self.one_time_payments + self.other
    }
}

/// Deductions subtracted from the net after taxes and contributions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Deductions {
    /// Unpaid leave.
    pub unpaid_leave: Decimal,
    /// Salary advances already paid out.
    pub advances: Decimal,
    /// Other deductions.
    pub other: Decimal,
}

impl Deductions {
    /// Sum of all deductions.
    pub fn total(&self) -> Decimal {
        self.unpaid_leave + self.advances + self.other
    }
}

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, legal basis and reasoning for one
/// rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The statutory reference for this rule (e.g. "§32a EStG").
    pub legal_ref: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// The complete audit trace for a payroll run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of calculation steps.
    pub steps: Vec<AuditStep>,
    /// Advisory warnings raised during the run.
    pub warnings: Vec<AdvisoryWarning>,
    /// The total calculation duration in microseconds.
    pub duration_us: u64,
}

/// One employee × one period.
///
/// Created once the orchestrator completes a run. The caller persists it as a
/// whole; it is never partially written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollEntry {
    /// Unique identifier for this entry.
    pub id: Uuid,
    /// The employee this entry belongs to.
    pub employee_id: String,
    /// The payroll period.
    pub period: PayrollPeriod,
    /// Worked time for the period.
    pub working_time: WorkingTimeData,
    /// The gross-to-net result.
    pub salary: SalaryCalculation,
    /// Explicit additions.
    pub additions: Additions,
    /// Deductions.
    pub deductions: Deductions,
    /// The industry module result, if the employee is not in the standard industry.
    pub industry: Option<IndustryPayrollResult>,
    /// Cash payout: net after deductions and benefits in kind, rounded to 2 decimals.
    pub final_net_salary: Decimal,
    /// Calculation audit trace.
    pub audit_trace: AuditTrace,
    /// When the entry was computed.
    pub created_at: DateTime<Utc>,
}

impl PayrollEntry {
    /// Projects the entry onto the compact history record.
    pub fn to_history(&self) -> HistoricalPayrollData {
        HistoricalPayrollData::from(self)
    }
}

/// Compact per-period projection of a [`PayrollEntry`].
///
/// History is an append-only time series keyed by `(employee_id, period)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalPayrollData {
    /// The employee.
    pub employee_id: String,
    /// The period.
    pub period: PayrollPeriod,
    /// Taxable monthly gross.
    pub gross_salary: Decimal,
    /// Final net after deductions.
    pub net_salary: Decimal,
    /// Overtime hours.
    pub overtime_hours: Decimal,
    /// Bonuses paid.
    pub bonuses: Decimal,
    /// Total deductions.
    pub deductions: Decimal,
    /// Monthly income tax withheld.
    pub income_tax: Decimal,
    /// Monthly employee social insurance share.
    pub employee_social_security: Decimal,
}

impl From<&PayrollEntry> for HistoricalPayrollData {
    fn from(entry: &PayrollEntry) -> Self {
        Self {
            employee_id: entry.employee_id.clone(),
            period: entry.period,
            gross_salary: entry.salary.gross_salary,
            net_salary: entry.final_net_salary,
            overtime_hours: entry.working_time.overtime_hours,
            bonuses: entry.additions.bonuses,
            deductions: entry.deductions.total(),
            income_tax: entry.salary.taxes.income_tax,
            employee_social_security: entry.salary.social_security.totals.employee,
        }
    }
}
