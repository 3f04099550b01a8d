//! HTTP directory adapter for buyer addresses and site industries.
//!
//! Both endpoints answer PATCH requests with an `{ error, results }`
//! envelope. Industries arrive under `results.inventories` and are
//! filtered to active, non-deleted rows; addresses arrive under
//! `results.address` and need the buyer's auth token.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::foundation::UserAuth;
use crate::domain::session::{AddressRecord, IndustryRecord};
use crate::ports::{DirectoryService, LookupError};

/// HTTP implementation of [`DirectoryService`].
pub struct HttpDirectoryService {
    client: Client,
    base_url: String,
}

impl HttpDirectoryService {
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

    fn map_send_error(e: reqwest::Error) -> LookupError {
        if e.is_timeout() {
            LookupError::Timeout
        } else {
            LookupError::Unavailable(e.to_string())
        }
    }
}

#[async_trait]
impl DirectoryService for HttpDirectoryService {
    async fn addresses_for(&self, auth: &UserAuth) -> Result<Vec<AddressRecord>, LookupError> {
        let url = format!("{}/user/getAddresses", self.base_url);

        let response = self
            .client
            .patch(&url)
            .header("Content-Type", "application/json")
            .header("x-auth-token-user", auth.as_str())
            .header("x-user-type", "Buyer")
            .header("x-auth-language", "English")
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Unavailable(format!(
                "address fetch returned {}",
                status
            )));
        }

        let envelope: AddressEnvelope = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        debug!(count = envelope.results.address.len(), "addresses fetched");
        Ok(envelope.results.address)
    }

    async fn industries(&self) -> Result<Vec<IndustryRecord>, LookupError> {
        let url = format!("{}/category/getAllIndustries", self.base_url);

        let response = self
            .client
            .patch(&url)
            .header("Content-Type", "application/json")
            .header("x-user-type", "Buyer")
            .header("x-auth-language", "English")
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Unavailable(format!(
                "industry fetch returned {}",
                status
            )));
        }

        let envelope: IndustryEnvelope = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        let industries: Vec<IndustryRecord> = envelope
            .results
            .inventories
            .into_iter()
            .filter(|row| row.status && !row.is_deleted)
            .map(|row| IndustryRecord {
                id: row.id,
                name_en: row.name_en,
            })
            .collect();

        debug!(count = industries.len(), "industries fetched");
        Ok(industries)
    }
}

#[derive(Debug, Deserialize)]
struct AddressEnvelope {
    #[serde(default)]
    results: AddressResults,
}

#[derive(Debug, Default, Deserialize)]
struct AddressResults {
    #[serde(default)]
    address: Vec<AddressRecord>,
}

#[derive(Debug, Deserialize)]
struct IndustryEnvelope {
    #[serde(default)]
    results: IndustryResults,
}

#[derive(Debug, Default, Deserialize)]
struct IndustryResults {
    #[serde(default)]
    inventories: Vec<IndustryRow>,
}

#[derive(Debug, Deserialize)]
struct IndustryRow {
    #[serde(alias = "_id")]
    id: String,

    #[serde(default, alias = "nameEn")]
    name_en: String,

    #[serde(default)]
    status: bool,

    #[serde(default, alias = "isDeleted")]
    is_deleted: bool,
}
