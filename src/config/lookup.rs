//! Marketplace lookup configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Marketplace API configuration (inventory, directory, orders)
#[derive(Debug, Clone, Deserialize)]
pub struct LookupConfig {
    /// Base URL of the marketplace API
    #[serde(default)]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Buyer auth token used by the demo binary
    pub user_token: Option<String>,
}

impl LookupConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate lookup configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("LOOKUP__BASE_URL"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout(),
            user_token: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_defaults() {
        let config = LookupConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert!(config.base_url.is_empty());
    }

    #[test]
    fn test_validation_requires_base_url() {
        assert!(LookupConfig::default().validate().is_err());
    }

    #[test]
    fn test_validation_rejects_non_http_urls() {
        let config = LookupConfig {
            base_url: "ftp://marketplace.example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBaseUrl)
        ));
    }

    #[test]
    fn test_validation_accepts_https_urls() {
        let config = LookupConfig {
            base_url: "https://marketplace.example.com:2053".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
