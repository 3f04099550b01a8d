//! Static and recording mocks for the marketplace ports.
//!
//! Used by unit tests and the end-to-end conversation tests to run the
//! full flow without network access.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::foundation::UserAuth;
use crate::domain::session::{AddressRecord, IndustryRecord, ProductRecord, Session};
use crate::ports::{
    DirectoryService, LookupError, OrderError, OrderPlacement, OrderReceipt, ProductLookup,
};

/// [`ProductLookup`] that answers every query with a fixed product list.
#[derive(Debug, Clone)]
pub struct StaticProductLookup {
    products: Vec<ProductRecord>,
}

impl StaticProductLookup {
    /// Creates a lookup returning the given products for any query.
    pub fn new(products: Vec<ProductRecord>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl ProductLookup for StaticProductLookup {
    async fn search(&self, _query: &str) -> Result<Vec<ProductRecord>, LookupError> {
        Ok(self.products.clone())
    }
}

/// [`DirectoryService`] backed by fixed address and industry lists.
#[derive(Debug, Clone)]
pub struct StaticDirectory {
    addresses: Vec<AddressRecord>,
    industries: Vec<IndustryRecord>,
}

impl StaticDirectory {
    /// Creates a directory with the given entries.
    pub fn new(addresses: Vec<AddressRecord>, industries: Vec<IndustryRecord>) -> Self {
        Self {
            addresses,
            industries,
        }
    }
}

#[async_trait]
impl DirectoryService for StaticDirectory {
    async fn addresses_for(&self, _auth: &UserAuth) -> Result<Vec<AddressRecord>, LookupError> {
        Ok(self.addresses.clone())
    }

    async fn industries(&self) -> Result<Vec<IndustryRecord>, LookupError> {
        Ok(self.industries.clone())
    }
}

/// [`OrderPlacement`] that records every placed session.
#[derive(Debug)]
pub struct RecordingOrderPlacement {
    order_id: Option<String>,
    failure: Option<String>,
    count: AtomicUsize,
    placed: Mutex<Vec<Session>>,
}

impl RecordingOrderPlacement {
    /// Creates a placement that succeeds with the given order id.
    pub fn succeeding(order_id: impl Into<String>) -> Self {
        Self {
            order_id: Some(order_id.into()),
            failure: None,
            count: AtomicUsize::new(0),
            placed: Mutex::new(Vec::new()),
        }
    }

    /// Creates a placement that rejects every request.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            order_id: None,
            failure: Some(message.into()),
            count: AtomicUsize::new(0),
            placed: Mutex::new(Vec::new()),
        }
    }

    /// Returns how many requests were successfully placed.
    pub fn placed_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Returns the sessions captured at placement time.
    pub fn placed_sessions(&self) -> Vec<Session> {
        self.placed
            .lock()
            .expect("placement lock poisoned")
            .clone()
    }
}

#[async_trait]
impl OrderPlacement for RecordingOrderPlacement {
    async fn place(&self, session: &Session) -> Result<OrderReceipt, OrderError> {
        if let Some(message) = &self.failure {
            return Err(OrderError::Rejected {
                message: message.clone(),
            });
        }

        self.count.fetch_add(1, Ordering::SeqCst);
        self.placed
            .lock()
            .expect("placement lock poisoned")
            .push(session.clone());

        Ok(OrderReceipt::new(
            self.order_id.clone(),
            "Order placed successfully!",
        ))
    }
}
