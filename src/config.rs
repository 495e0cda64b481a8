/*!
 * Configuration types for Warden
 */

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;
use warden_core_restrict::EscalationThresholds;
use warden_sweeper::SweeperConfig;

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Main configuration for the restriction engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Warning-count escalation thresholds and durations
    #[serde(default)]
    pub escalation: EscalationThresholds,

    /// Seconds between background expiry sweeps
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Geofence radius applied to jail sites created without an explicit one
    #[serde(default = "default_jail_radius")]
    pub jail_radius: f64,

    /// Seconds an entity must wait between chat messages (0 = disabled)
    #[serde(default)]
    pub slow_mode_secs: u64,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_jail_radius() -> f64 {
    10.0
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            escalation: EscalationThresholds::default(),
            sweep_interval_secs: default_sweep_interval_secs(),
            jail_radius: default_jail_radius(),
            slow_mode_secs: 0,
            log_level: LogLevel::default(),
            log_file: None,
            verbose: false,
        }
    }
}

impl WardenConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: WardenConfig = toml::from_str(&text)?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Returns an error message if the configuration is invalid. Note that
    /// non-monotonic escalation thresholds are *not* an error: the policy
    /// evaluates them top-down as written, and the engine logs a warning.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.sweep_interval_secs == 0 {
            return Err("sweep_interval_secs must be greater than 0".to_string());
        }

        if self.jail_radius <= 0.0 {
            return Err("jail_radius must be positive".to_string());
        }

        Ok(())
    }

    /// Sweeper configuration derived from this config
    pub fn sweeper_config(&self) -> SweeperConfig {
        SweeperConfig {
            interval_secs: self.sweep_interval_secs,
        }
    }
}
