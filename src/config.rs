//! Configuration management for Chargelog
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::error::{ChargelogError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_true() -> bool {
    true
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Local database configuration
    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Charging timer configuration
    pub timer: TimerConfig,

    /// Pricing defaults for session cost calculation
    pub pricing: PricingConfig,

    /// Notification surface configuration
    pub notifications: NotificationsConfig,
}

/// Local database parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file (or directory for rotated logs)
    pub file: String,

    /// Optional console-specific level override
    #[serde(default)]
    pub console_level: Option<String>,

    /// Optional file-specific level override
    #[serde(default)]
    pub file_level: Option<String>,

    /// Number of rotated log files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Charging timer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Interval between elapsed-time updates in milliseconds
    pub tick_interval_ms: u64,
}

/// Pricing defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Default cost of one kWh in pence
    pub default_pence_per_kwh: i64,

    /// Default charger output in kilowatts
    pub default_kilowatt_rate: f64,

    /// Currency symbol for display
    pub currency_symbol: String,
}

/// Notification surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Whether the charging-in-progress notification is shown
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "chargelog.db".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/chargelog.log".to_string(),
            console_level: None,
            file_level: None,
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
        }
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_pence_per_kwh: 30,
            default_kilowatt_rate: 7.4,
            currency_symbol: "£".to_string(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            timer: TimerConfig::default(),
            pricing: PricingConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        let default_paths = [
            "chargelog_config.yaml",
            "/data/chargelog_config.yaml",
            "/etc/chargelog/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.path.is_empty() {
            return Err(ChargelogError::validation(
                "database.path",
                "Database path cannot be empty",
            ));
        }

        if self.timer.tick_interval_ms == 0 {
            return Err(ChargelogError::validation(
                "timer.tick_interval_ms",
                "Must be greater than 0",
            ));
        }

        if self.pricing.default_pence_per_kwh < 0 {
            return Err(ChargelogError::validation(
                "pricing.default_pence_per_kwh",
                "Must not be negative",
            ));
        }

        if self.pricing.default_kilowatt_rate <= 0.0 {
            return Err(ChargelogError::validation(
                "pricing.default_kilowatt_rate",
                "Must be positive",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, "chargelog.db");
        assert_eq!(config.timer.tick_interval_ms, 1000);
        assert_eq!(config.pricing.default_pence_per_kwh, 30);
        assert!(config.notifications.enabled);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        // Test empty database path
        config.database.path = String::new();
        assert!(config.validate().is_err());

        // Reset and test invalid tick interval
        config = Config::default();
        config.timer.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let deserialized: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            config.timer.tick_interval_ms,
            deserialized.timer.tick_interval_ms
        );
    }
}
