//! Persistence seam for the anomaly engine.
//!
//! Storage is an external concern. The engine reads history and anomalies
//! and writes results through [`PayrollRepository`]; [`InMemoryRepository`]
//! backs tests and the HTTP service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::RateRegistry;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AnomalySeverity, Employee, HistoricalPayrollData, PayrollAnomaly, PayrollEntry,
    SalaryForecast,
};

use super::anomaly_detection::{AnomalyDetectionConfig, detect_anomalies};
use super::forecast::{ForecastConfig, generate_salary_forecast};
use super::health_score::calculate_health_score;

/// Storage for payroll history and anomalies.
///
/// Writes must be atomic per call: a failed call leaves the store unchanged.
pub trait PayrollRepository {
    /// Returns the history, optionally restricted to one employee.
    fn history(&self, employee_id: Option<&str>) -> EngineResult<Vec<HistoricalPayrollData>>;

    /// Appends completed entries to the history.
    fn append_history(&mut self, records: &[HistoricalPayrollData]) -> EngineResult<()>;

    /// Returns all anomalies.
    fn anomalies(&self) -> EngineResult<Vec<PayrollAnomaly>>;

    /// Stores newly detected anomalies.
    fn insert_anomalies(&mut self, anomalies: &[PayrollAnomaly]) -> EngineResult<()>;

    /// Replaces an existing anomaly with the same id.
    fn update_anomaly(&mut self, anomaly: &PayrollAnomaly) -> EngineResult<()>;

    /// Returns anomalies that are still open.
    fn open_anomalies(&self) -> EngineResult<Vec<PayrollAnomaly>> {
        Ok(self
            .anomalies()?
            .into_iter()
            .filter(PayrollAnomaly::is_open)
            .collect())
    }

    /// Looks up an anomaly by id.
    fn find_anomaly(&self, id: Uuid) -> EngineResult<PayrollAnomaly> {
        self.anomalies()?
            .into_iter()
            .find(|a| a.id == id)
            .ok_or_else(|| EngineError::AnomalyNotFound {
                anomaly_id: id.to_string(),
            })
    }
}

/// A [`PayrollRepository`] held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    history: Vec<HistoricalPayrollData>,
    anomalies: Vec<PayrollAnomaly>,
}

impl InMemoryRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository seeded with history.
    pub fn with_history(history: Vec<HistoricalPayrollData>) -> Self {
        Self {
            history,
            anomalies: Vec::new(),
        }
    }
}

impl PayrollRepository for InMemoryRepository {
    fn history(&self, employee_id: Option<&str>) -> EngineResult<Vec<HistoricalPayrollData>> {
        Ok(self
            .history
            .iter()
            .filter(|r| employee_id.is_none_or(|id| r.employee_id == id))
            .cloned()
            .collect())
    }

    fn append_history(&mut self, records: &[HistoricalPayrollData]) -> EngineResult<()> {
        self.history.extend_from_slice(records);
        Ok(())
    }

    fn anomalies(&self) -> EngineResult<Vec<PayrollAnomaly>> {
        Ok(self.anomalies.clone())
    }

    fn insert_anomalies(&mut self, anomalies: &[PayrollAnomaly]) -> EngineResult<()> {
        self.anomalies.extend_from_slice(anomalies);
        Ok(())
    }

    fn update_anomaly(&mut self, anomaly: &PayrollAnomaly) -> EngineResult<()> {
        let slot = self
            .anomalies
            .iter_mut()
            .find(|a| a.id == anomaly.id)
            .ok_or_else(|| EngineError::AnomalyNotFound {
                anomaly_id: anomaly.id.to_string(),
            })?;
        *slot = anomaly.clone();
        Ok(())
    }
}

/// Outcome of an anomaly scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Anomalies raised by this scan.
    pub anomalies: Vec<PayrollAnomaly>,
    /// Health score over all anomalies in the repository after the scan.
    pub health_score: u32,
}

/// Runs anomaly scans against a repository.
#[derive(Debug)]
pub struct AnomalyScanner<R> {
    repository: R,
    config: AnomalyDetectionConfig,
}

impl<R: PayrollRepository> AnomalyScanner<R> {
    /// Creates a scanner over a repository.
    pub fn new(repository: R, config: AnomalyDetectionConfig) -> Self {
        Self { repository, config }
    }

    /// The underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Consumes the scanner, returning the repository.
    pub fn into_repository(self) -> R {
        self.repository
    }

    /// Scans new entries against the stored history and open anomalies and
    /// stores the anomalies found.
    ///
    /// The entries themselves are not added to the history; call
    /// [`record_entries`](Self::record_entries) once they are final.
    pub fn scan(
        &mut self,
        employees: &[Employee],
        new_entries: &[PayrollEntry],
        rates: &RateRegistry,
        detected_at: DateTime<Utc>,
    ) -> EngineResult<ScanReport> {
        let history = self.repository.history(None)?;
        let open = self.repository.open_anomalies()?;

        let anomalies = detect_anomalies(
            employees,
            new_entries,
            &history,
            &open,
            rates,
            &self.config,
            detected_at,
        );
        self.repository.insert_anomalies(&anomalies)?;

        let health_score = calculate_health_score(&self.repository.anomalies()?);
        info!(
            entries = new_entries.len(),
            detected = anomalies.len(),
            health_score,
            "Anomaly scan completed"
        );
        Ok(ScanReport {
            anomalies,
            health_score,
        })
    }

    /// Appends entries to the history.
    pub fn record_entries(&mut self, entries: &[PayrollEntry]) -> EngineResult<()> {
        let records: Vec<HistoricalPayrollData> =
            entries.iter().map(PayrollEntry::to_history).collect();
        self.repository.append_history(&records)
    }

    /// Marks an anomaly resolved.
    pub fn resolve(&mut self, id: Uuid, at: DateTime<Utc>) -> EngineResult<PayrollAnomaly> {
        let resolved = self.repository.find_anomaly(id)?.resolve(at)?;
        self.repository.update_anomaly(&resolved)?;
        Ok(resolved)
    }

    /// Marks an anomaly dismissed.
    pub fn dismiss(&mut self, id: Uuid, at: DateTime<Utc>) -> EngineResult<PayrollAnomaly> {
        let dismissed = self.repository.find_anomaly(id)?.dismiss(at)?;
        self.repository.update_anomaly(&dismissed)?;
        Ok(dismissed)
    }

    /// Relabels the severity of an open anomaly.
    pub fn relabel(&mut self, id: Uuid, severity: AnomalySeverity) -> EngineResult<PayrollAnomaly> {
        let relabeled = self.repository.find_anomaly(id)?.with_severity(severity)?;
        self.repository.update_anomaly(&relabeled)?;
        Ok(relabeled)
    }

    /// Current health score.
    pub fn health_score(&self) -> EngineResult<u32> {
        Ok(calculate_health_score(&self.repository.anomalies()?))
    }

    /// Forecasts an employee's salary from the stored history.
    pub fn forecast(
        &self,
        employee_id: &str,
        months: u32,
        config: &ForecastConfig,
    ) -> EngineResult<SalaryForecast> {
        let history = self.repository.history(Some(employee_id))?;
        generate_salary_forecast(employee_id, &history, months, config)
    }
}
