// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Dispatcher configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

/// Persistent dispatcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// How long `stop()` waits for the dispatch loop before aborting it (ms).
    pub shutdown_grace_ms: u64,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Divisor applied to document durations by the dry-run printer.
    pub dry_run_speed: f64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_ms: 5_000,
            log_filter: "info".into(),
            dry_run_speed: 1.0,
        }
    }
}

impl DispatcherConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Load configuration from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.dry_run_speed.is_finite() && self.dry_run_speed > 0.0) {
            return Err(DispatchError::Config(format!(
                "dry_run_speed must be a positive number, got {}",
                self.dry_run_speed
            )));
        }
        if self.log_filter.trim().is_empty() {
            return Err(DispatchError::Config("log_filter must not be empty".into()));
        }
        Ok(())
    }
}
