//! Rate table loading functionality.
//!
//! This module provides the [`RateRegistry`] type, a year-keyed registry of
//! [`RateTable`]s loaded from YAML files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::types::RateTable;

const BUILTIN_TABLES: &[(&str, &str)] = &[
    ("config/rates/2024.yaml", include_str!("../../config/rates/2024.yaml")),
    ("config/rates/2025.yaml", include_str!("../../config/rates/2025.yaml")),
];

/// Year-keyed registry of rate tables.
///
/// The registry is loaded once at process start and shared read-only.
///
/// # Directory Structure
///
/// ```text
/// config/rates/
/// ├── 2024.yaml
/// └── 2025.yaml
/// ```
///
/// # Example
///
/// ```
/// use lohnwerk::config::RateRegistry;
///
/// let registry = RateRegistry::builtin().unwrap();
/// let table = registry.get(2025).unwrap();
/// assert_eq!(table.year, 2025);
/// ```
#[derive(Debug, Clone)]
pub struct RateRegistry {
    tables: BTreeMap<i32, RateTable>,
}

impl RateRegistry {
    /// Loads every `*.yaml` rate table from a directory.
    ///
    /// # Errors
    ///
    /// - `ConfigNotFound` if the directory is missing or holds no rate files
    /// - `ConfigParseError` if a file is not a valid rate table, or two files
    ///   declare the same year
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let dir_str = path.display().to_string();

        let entries = fs::read_dir(path).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut sources = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;
            let file = entry.path();
            if file.extension().is_some_and(|ext| ext == "yaml") {
                let file_str = file.display().to_string();
                let content =
                    fs::read_to_string(&file).map_err(|_| EngineError::ConfigNotFound {
                        path: file_str.clone(),
                    })?;
                sources.push((file_str, content));
            }
        }

        if sources.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no rate files found)", dir_str),
            });
        }

        Self::from_sources(sources.iter().map(|(p, c)| (p.as_str(), c.as_str())))
    }

    /// Builds the registry from the rate tables compiled into the crate.
    pub fn builtin() -> EngineResult<Self> {
        Self::from_sources(BUILTIN_TABLES.iter().copied())
    }

    /// Builds a registry from already-parsed tables.
    pub fn from_tables(tables: impl IntoIterator<Item = RateTable>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| (t.year, t)).collect(),
        }
    }

    fn from_sources<'a>(sources: impl Iterator<Item = (&'a str, &'a str)>) -> EngineResult<Self> {
        let mut tables = BTreeMap::new();
        for (path, content) in sources {
            let table: RateTable =
                serde_yaml::from_str(content).map_err(|e| EngineError::ConfigParseError {
                    path: path.to_string(),
                    message: e.to_string(),
                })?;
            if tables.contains_key(&table.year) {
                return Err(EngineError::ConfigParseError {
                    path: path.to_string(),
                    message: format!("duplicate rate table for year {}", table.year),
                });
            }
            debug!(year = table.year, path, "Loaded rate table");
            tables.insert(table.year, table);
        }
        Ok(Self { tables })
    }

    /// Returns the rate table for a year.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedTaxYear` when no table exists for `year`.
    pub fn get(&self, year: i32) -> EngineResult<&RateTable> {
        self.tables
            .get(&year)
            .ok_or(EngineError::UnsupportedTaxYear { year })
    }

    /// Returns the supported years in ascending order.
    pub fn years(&self) -> Vec<i32> {
        self.tables.keys().copied().collect()
    }
}
