//! HTTP order placement adapter.
//!
//! Submits the finalized request as multipart form data, shaped exactly as
//! the marketplace's placeOrder endpoint expects: the address travels as a
//! JSON string, sample orders carry an uppercase `isSampleOrder` flag, and
//! the optional terms are only included when collected.

use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::catalog::fields;
use crate::domain::session::{RequestType, Session};
use crate::ports::{OrderError, OrderPlacement, OrderReceipt};

/// HTTP implementation of [`OrderPlacement`].
pub struct HttpOrderPlacement {
    client: Client,
    base_url: String,
}

impl HttpOrderPlacement {
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

    fn build_form(session: &Session) -> Result<Form, OrderError> {
        let Some(product) = &session.product else {
            return Err(OrderError::Rejected {
                message: "no confirmed product on the session".to_string(),
            });
        };
        let Some(request_type) = session.request_type else {
            return Err(OrderError::Rejected {
                message: "no confirmed request type on the session".to_string(),
            });
        };

        let address_json = match &session.delivery.address {
            Some(address) => serde_json::json!({
                "email": address.email,
                "name": address.name,
                "phoneNumber": address.phone_number,
                "countryCode": address.country_code,
                "addressLine": address.address_line,
                "latitude": address.latitude,
                "longitude": address.longitude,
            })
            .to_string(),
            None => {
                return Err(OrderError::Rejected {
                    message: "no delivery address on the session".to_string(),
                })
            }
        };

        let field_text = |name: &str| {
            session
                .details
                .fields
                .get(name)
                .map(|value| value.to_string())
                .filter(|text| !text.trim().is_empty())
        };

        let mut form = Form::new()
            .text("address", address_json)
            .text("product", product.product_id.clone())
            .text("quantity", field_text(fields::QUANTITY).unwrap_or_default())
            .text(
                "expectedAmount",
                field_text(fields::EXPECTED_PRICE).unwrap_or_default(),
            )
            .text("quantityType", field_text(fields::UNIT).unwrap_or_default())
            .text("type", capitalized(request_type));

        if request_type == RequestType::Sample {
            form = form.text("isSampleOrder", "TRUE");
        }
        if let Some(industry) = &session.delivery.industry {
            form = form.text("industry", industry.id.clone());
        }
        if let Some(incoterm) = field_text(fields::INCOTERM) {
            form = form.text("incoterm", incoterm);
        }
        if let Some(payment) = field_text(fields::MODE_OF_PAYMENT) {
            form = form.text("modeOfPayment", payment);
        }
        if let Some(packaging) = field_text(fields::PACKAGING_PREF) {
            form = form.text("packingType", packaging);
        }
        if let Some(date) = field_text(fields::DELIVERY_DATE) {
            form = form.text("expectedPurchaseDate", date);
        }
        if let Some(phone) = field_text(fields::PHONE) {
            form = form.text("shippingContactNumber", phone);
        }

        Ok(form)
    }
}

/// The endpoint expects capitalized type names.
fn capitalized(request_type: RequestType) -> &'static str {
    match request_type {
        RequestType::Sample => "Sample",
        RequestType::Quotation => "Quotation",
        RequestType::Ppr => "Ppr",
        RequestType::Order => "Order",
    }
}

#[async_trait]
impl OrderPlacement for HttpOrderPlacement {
    async fn place(&self, session: &Session) -> Result<OrderReceipt, OrderError> {
        if session.user_auth.as_str().is_empty() {
            return Err(OrderError::MissingAuth);
        }

        let form = Self::build_form(session)?;
        let url = format!("{}/order/placeOrder", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-auth-token-user", session.user_auth.as_str())
            .header("x-user-type", "Buyer")
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OrderError::Timeout
                } else {
                    OrderError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OrderError::Network(e.to_string()))?;

        debug!(status = %status, "order endpoint answered");

        // 206 responses still carry a full order envelope.
        if !(status.is_success() || status.as_u16() == 206) {
            return Err(OrderError::Rejected {
                message: format!("order endpoint returned {}", status),
            });
        }

        let envelope: OrderEnvelope =
            serde_json::from_str(&body).map_err(|e| OrderError::Parse(e.to_string()))?;

        if envelope.error {
            return Err(OrderError::Rejected {
                message: envelope
                    .message
                    .unwrap_or_else(|| "unknown order error".to_string()),
            });
        }

        Ok(OrderReceipt::new(
            envelope.results.order.map(|order| order.id),
            envelope
                .message
                .unwrap_or_else(|| "Order placed successfully!".to_string()),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct OrderEnvelope {
    #[serde(default)]
    error: bool,

    #[serde(default)]
    message: Option<String>,

    #[serde(default)]
    results: OrderResults,
}

#[derive(Debug, Default, Deserialize)]
struct OrderResults {
    #[serde(default)]
    order: Option<OrderRow>,
}

#[derive(Debug, Deserialize)]
struct OrderRow {
    #[serde(alias = "_id")]
    id: String,
}
