//! HTTP inventory lookup adapter.
//!
//! Queries the marketplace's free-text product search. The endpoint takes
//! a PATCH with the query terms and wraps its rows in an
//! `{ error, results: { products } }` envelope.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::session::ProductRecord;
use crate::ports::{LookupError, ProductLookup};

/// HTTP implementation of [`ProductLookup`].
pub struct HttpProductLookup {
    client: Client,
    base_url: String,
}

impl HttpProductLookup {
    /// Creates the adapter against a marketplace base URL.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ProductLookup for HttpProductLookup {
    async fn search(&self, query: &str) -> Result<Vec<ProductRecord>, LookupError> {
        let url = format!("{}/inventory/getQueryResult", self.base_url);

        let response = self
            .client
            .patch(&url)
            .header("Content-Type", "application/json")
            .header("x-user-type", "Buyer")
            .header("x-auth-language", "English")
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout
                } else {
                    LookupError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Unavailable(format!(
                "inventory search returned {}",
                status
            )));
        }

        let envelope: SearchEnvelope = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        debug!(query, hits = envelope.results.products.len(), "inventory search returned");
        Ok(envelope.results.products)
    }
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    results: SearchResults,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResults {
    #[serde(default)]
    products: Vec<ProductRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parses_products() {
        let json = r#"{
            "error": false,
            "message": "ok",
            "results": {
                "products": [
                    {"_id": "p1", "nameEn": "Sulfuric Acid", "unit": "KG", "minQuantity": 10}
                ]
            }
        }"#;
        let envelope: SearchEnvelope = serde_json::from_str(json).unwrap();

        assert_eq!(envelope.results.products.len(), 1);
        assert_eq!(envelope.results.products[0].id, "p1");
        assert_eq!(envelope.results.products[0].min_quantity, Some(10.0));
    }

    #[test]
    fn envelope_tolerates_missing_results() {
        let envelope: SearchEnvelope = serde_json::from_str(r#"{"error": true}"#).unwrap();
        assert!(envelope.results.products.is_empty());
    }
}
