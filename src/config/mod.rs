//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment
//! variables using the `config` and `dotenvy` crates. Configuration is
//! loaded with the `FALCON_ASSIST_` prefix and nested values use double
//! underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use falcon_assist::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod error;
mod lookup;
mod session;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use lookup::LookupConfig;
pub use session::SessionConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Reasoning provider configuration
    #[serde(default)]
    pub ai: AiConfig,

    /// Marketplace API configuration
    #[serde(default)]
    pub lookup: LookupConfig,

    /// Session lifecycle configuration
    #[serde(default)]
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads a `.env` file if present (for development)
    /// 2. Reads environment variables with the `FALCON_ASSIST` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// e.g. `FALCON_ASSIST__AI__API_KEY=sk-or-...`
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("FALCON_ASSIST")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Validate every configuration section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ai.validate()?;
        self.lookup.validate()?;
        self.session.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_fails_validation_without_credentials() {
        let config = AppConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn populated_config_validates() {
        let config = AppConfig {
            ai: AiConfig {
                api_key: Some("sk-or-xxx".to_string()),
                ..Default::default()
            },
            lookup: LookupConfig {
                base_url: "https://marketplace.example.com".to_string(),
                ..Default::default()
            },
            session: SessionConfig::default(),
        };
        assert!(config.validate().is_ok());
    }
}
