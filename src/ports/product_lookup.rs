//! Product Lookup Port - Interface for searching the inventory.
//!
//! The lookup is treated as unreliable: it may error or return zero rows.
//! Callers cache usable results per session and must never surface a
//! product the lookup did not return.

use async_trait::async_trait;

use crate::domain::session::ProductRecord;

/// Port for free-text inventory searches.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    /// Searches the inventory with free-text query terms.
    async fn search(&self, query: &str) -> Result<Vec<ProductRecord>, LookupError>;
}

/// Errors from the lookup services.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// Service is unreachable or returned a server error.
    #[error("lookup service unavailable: {0}")]
    Unavailable(String),

    /// Response could not be parsed.
    #[error("failed to parse lookup response: {0}")]
    Parse(String),

    /// Request timed out.
    #[error("lookup request timed out")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_error_displays_reason() {
        let err = LookupError::Unavailable("503".to_string());
        assert!(err.to_string().contains("unavailable"));
        assert!(err.to_string().contains("503"));
    }
}
