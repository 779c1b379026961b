//! Application state for the payroll API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::RateRegistry;

/// Shared application state.
///
/// Holds the yearly rate tables, loaded once at startup and shared
/// read-only across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The loaded rate tables.
    rates: Arc<RateRegistry>,
}

impl AppState {
    /// Creates a new application state with the given rate tables.
    pub fn new(rates: RateRegistry) -> Self {
        Self {
            rates: Arc::new(rates),
        }
    }

    /// Returns a reference to the rate tables.
    pub fn rates(&self) -> &RateRegistry {
        &self.rates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        // Verify AppState can be cloned (required for axum state)
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_clones_share_rate_tables() {
        let state = AppState::new(RateRegistry::builtin().unwrap());
        let clone = state.clone();
        assert!(std::ptr::eq(state.rates(), clone.rates()));
        assert!(clone.rates().years().contains(&2025));
    }
}
