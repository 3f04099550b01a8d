//! Order Placement Port - Interface for submitting the finalized request.
//!
//! Called once by the AddressPurpose stage when the buyer explicitly
//! confirms, with the complete session as input.

use async_trait::async_trait;

use crate::domain::session::Session;

/// Receipt returned when a request is successfully placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    /// Identifier assigned by the marketplace, when provided.
    pub order_id: Option<String>,
    /// Confirmation message to relay to the buyer.
    pub message: String,
}

impl OrderReceipt {
    /// Creates a new receipt.
    pub fn new(order_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            order_id,
            message: message.into(),
        }
    }
}

/// Errors from placing an order.
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// The session carries no usable credential.
    #[error("no authentication token available")]
    MissingAuth,

    /// The marketplace rejected the request.
    #[error("order rejected: {message}")]
    Rejected { message: String },

    /// Network failure while submitting.
    #[error("network error: {0}")]
    Network(String),

    /// Response could not be parsed.
    #[error("failed to parse order response: {0}")]
    Parse(String),

    /// Request timed out.
    #[error("order request timed out")]
    Timeout,
}

/// Port for placing the finalized request.
#[async_trait]
pub trait OrderPlacement: Send + Sync {
    /// Submits the request described by the session.
    async fn place(&self, session: &Session) -> Result<OrderReceipt, OrderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_carries_id_and_message() {
        let receipt = OrderReceipt::new(Some("ord-1".into()), "Order placed successfully!");
        assert_eq!(receipt.order_id.as_deref(), Some("ord-1"));
        assert!(receipt.message.contains("successfully"));
    }

    #[test]
    fn rejected_error_displays_reason() {
        let err = OrderError::Rejected {
            message: "quantity no longer available".to_string(),
        };
        assert!(err.to_string().contains("quantity no longer available"));
    }
}
