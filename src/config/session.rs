//! Session lifecycle configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Session retention and conversation tunables
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Hours an idle session is kept before the sweep purges it
    #[serde(default = "default_retention_hours")]
    pub retention_hours: i64,

    /// Seconds between expiry sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Recent exchanges replayed to the reasoning service
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Directory for the file-backed session store
    #[serde(default = "default_store_path")]
    pub store_path: String,
}

impl SessionConfig {
    /// Get the sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.retention_hours < 1 {
            return Err(ValidationError::InvalidRetention);
        }
        if self.history_window == 0 {
            return Err(ValidationError::InvalidHistoryWindow);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retention_hours: default_retention_hours(),
            sweep_interval_secs: default_sweep_interval(),
            history_window: default_history_window(),
            store_path: default_store_path(),
        }
    }
}

fn default_retention_hours() -> i64 {
    24
}

fn default_sweep_interval() -> u64 {
    3600
}

fn default_history_window() -> usize {
    6
}

fn default_store_path() -> String {
    "./data/sessions".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.retention_hours, 24);
        assert_eq!(config.sweep_interval_secs, 3600);
        assert_eq!(config.history_window, 6);
    }

    #[test]
    fn test_validation_rejects_zero_retention() {
        let config = SessionConfig {
            retention_hours: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidRetention)
        ));
    }

    #[test]
    fn test_validation_rejects_zero_history_window() {
        let config = SessionConfig {
            history_window: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
