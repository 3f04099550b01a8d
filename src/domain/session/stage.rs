//! Session stage state machine.
//!
//! Defines the three mutually exclusive phases of a session's lifecycle
//! and the valid handovers between them.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// The active phase of a session.
///
/// Sessions move strictly forward through these stages:
/// - `ProductSelection`: find and confirm a product plus a request type
/// - `RequestDetails`: collect and validate the per-request fields
/// - `AddressPurpose`: pick a delivery address and industry, then finalize
///
/// Exactly one stage is active at a time; the router dispatches each turn
/// to the handler matching the stored stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Searching inventory and confirming a product and request type.
    #[default]
    ProductSelection,

    /// Collecting quantities, terms, and dates for the confirmed request.
    RequestDetails,

    /// Choosing delivery address and industry, then placing the request.
    AddressPurpose,
}

impl Stage {
    /// Returns a short label for the stage, suitable for logs and display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ProductSelection => "Product Selection",
            Self::RequestDetails => "Request Details",
            Self::AddressPurpose => "Address & Purpose",
        }
    }

    /// Returns the stage that follows this one, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::ProductSelection => Some(Self::RequestDetails),
            Self::RequestDetails => Some(Self::AddressPurpose),
            Self::AddressPurpose => None,
        }
    }
}

impl StateMachine for Stage {
    fn can_transition_to(&self, target: &Self) -> bool {
        use Stage::*;
        matches!(
            (self, target),
            // Product and request type confirmed
            (ProductSelection, RequestDetails) |
            // All required fields collected and validated
            (RequestDetails, AddressPurpose)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use Stage::*;
        match self {
            ProductSelection => vec![RequestDetails],
            RequestDetails => vec![AddressPurpose],
            AddressPurpose => vec![],
        }
    }
}
