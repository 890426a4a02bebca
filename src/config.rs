//! Central configuration for the roundlot service.
//!
//! All service-level parameters are defined here for easy tuning; the
//! HTTP bind address comes from `ServerConfig::from_env`.

use std::time::Duration;
use types::Cash;

/// Master configuration for the service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // ─────────────────────────────────────────────────────────────────────────
    // Ledger
    // ─────────────────────────────────────────────────────────────────────────
    /// Balance seeded into newly created accounts (demo constant).
    pub initial_balance: Cash,

    // ─────────────────────────────────────────────────────────────────────────
    // Scheduler
    // ─────────────────────────────────────────────────────────────────────────
    /// Wake cadence of the round scheduler.
    pub scheduler_period: Duration,

    // ─────────────────────────────────────────────────────────────────────────
    // Storage
    // ─────────────────────────────────────────────────────────────────────────
    /// SQLite database path; None keeps auctions in memory.
    pub db_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            initial_balance: Cash::from_float(1000.0),
            scheduler_period: Duration::from_secs(5),
            db_path: None,
        }
    }
}

impl AppConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Config from environment: `ROUNDLOT_DB` selects the durable store.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("ROUNDLOT_DB") {
            if !path.is_empty() {
                config.db_path = Some(path);
            }
        }
        config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder-style setters
    // ─────────────────────────────────────────────────────────────────────────

    /// Set the seed balance for new accounts.
    pub fn initial_balance(mut self, balance: Cash) -> Self {
        self.initial_balance = balance;
        self
    }

    /// Set the scheduler wake cadence.
    pub fn scheduler_period(mut self, period: Duration) -> Self {
        self.scheduler_period = period;
        self
    }

    /// Persist auctions to a SQLite database at `path`.
    pub fn durable(mut self, path: impl Into<String>) -> Self {
        self.db_path = Some(path.into());
        self
    }
}
