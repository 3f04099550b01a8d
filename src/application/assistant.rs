//! The assistant router.
//!
//! Owns the full turn lifecycle: load or create the session, dispatch to
//! the stage handler matching the stored stage, apply stage expansion when
//! a handover occurred, persist, and reply. The single boundary operation,
//! [`Assistant::handle_turn`], never fails outward: every failure path
//! resolves to a user-facing apology with the pre-turn session intact.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::domain::foundation::{SessionId, Timestamp, UserAuth};
use crate::domain::session::{Session, Stage};
use crate::ports::{
    DirectoryService, OrderPlacement, ProductLookup, ReasoningService, SessionStore,
    SessionStoreError,
};

use super::stages::{
    AddressPurposeStage, ProductSelectionStage, RequestDetailsStage, StageOutcome,
};

/// Reply returned whenever a turn fails for any internal reason.
pub const APOLOGY_REPLY: &str =
    "I apologize, but I'm having trouble processing your request. Please try again.";

/// Reply returned when a stored session could not be decoded and was reset.
pub const RESET_REPLY: &str =
    "Something went wrong with this conversation's state, so I've started a fresh one. \
     What product can I help you with today?";

/// Tunables for the router.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Sessions idle longer than this are purged and recreated.
    pub retention_hours: i64,
    /// How many recent exchanges are replayed to the reasoning service.
    pub history_window: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            retention_hours: 24,
            history_window: 6,
        }
    }
}

/// The conversation router.
pub struct Assistant {
    store: Arc<dyn SessionStore>,
    product_selection: ProductSelectionStage,
    request_details: RequestDetailsStage,
    address_purpose: AddressPurposeStage,
    retention_hours: i64,
    // Serializes turns per session id; entries for idle sessions are
    // dropped by the expiry sweep.
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl Assistant {
    /// Wires the router with its store and the handlers' collaborating ports.
    pub fn new(
        store: Arc<dyn SessionStore>,
        reasoning: Arc<dyn ReasoningService>,
        products: Arc<dyn ProductLookup>,
        directory: Arc<dyn DirectoryService>,
        orders: Arc<dyn OrderPlacement>,
        config: AssistantConfig,
    ) -> Self {
        Self {
            store,
            product_selection: ProductSelectionStage::new(
                Arc::clone(&reasoning),
                products,
                config.history_window,
            ),
            request_details: RequestDetailsStage::new(
                Arc::clone(&reasoning),
                config.history_window,
            ),
            address_purpose: AddressPurposeStage::new(
                reasoning,
                directory,
                orders,
                config.history_window,
            ),
            retention_hours: config.retention_hours,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Handles one inbound turn and returns the reply text.
    ///
    /// A turn either completes and persists, or fails and persists nothing:
    /// a handler error leaves the stored session exactly as it was before
    /// the turn.
    pub async fn handle_turn(
        &self,
        session_id: SessionId,
        user_auth: UserAuth,
        user_text: &str,
    ) -> String {
        let lock = self.lock_for(&session_id).await;
        let _guard = lock.lock().await;

        let (session, was_reset) = match self.load_or_create(&session_id, &user_auth).await {
            Ok(loaded) => loaded,
            Err(err) => {
                error!(session_id = %session_id, error = %err, "session load failed");
                return APOLOGY_REPLY.to_string();
            }
        };
        if was_reset {
            return RESET_REPLY.to_string();
        }

        let stage_before = session.stage;
        let outcome = match stage_before {
            Stage::ProductSelection => {
                self.product_selection.respond(user_text, session).await
            }
            Stage::RequestDetails => self.request_details.respond(user_text, session).await,
            Stage::AddressPurpose => self.address_purpose.respond(user_text, session).await,
        };

        match outcome {
            Ok(StageOutcome {
                reply,
                session: mut updated,
            }) => {
                if updated.stage != stage_before {
                    match updated.stage {
                        Stage::RequestDetails => updated.expand_for_request_details(),
                        Stage::AddressPurpose => updated.expand_for_address_purpose(),
                        Stage::ProductSelection => {}
                    }
                    info!(
                        session_id = %updated.session_id,
                        from = stage_before.label(),
                        to = updated.stage.label(),
                        "stage handover"
                    );
                }

                updated.record_exchange(user_text, &reply);
                updated.touch();
                if let Err(err) = self.store.upsert(&updated).await {
                    error!(session_id = %updated.session_id, error = %err, "session persist failed");
                    return APOLOGY_REPLY.to_string();
                }
                reply
            }
            Err(err) => {
                warn!(session_id = %session_id, error = %err, "turn failed, session unchanged");
                APOLOGY_REPLY.to_string()
            }
        }
    }

    /// Purges sessions past the retention window.
    ///
    /// Runs independently of request handling; call it from a periodic
    /// task. Also drops per-session lock entries nobody is holding.
    pub async fn sweep_expired(&self) -> Result<usize, SessionStoreError> {
        let cutoff = Timestamp::now().minus_hours(self.retention_hours);
        let removed = self.store.purge_expired(cutoff).await?;
        if removed > 0 {
            info!(removed, "expired sessions purged");
        }

        self.locks
            .lock()
            .await
            .retain(|_, lock| Arc::strong_count(lock) > 1);

        Ok(removed)
    }

    /// Loads the session for an id, creating (and persisting) a fresh one
    /// when the id is unseen, the record has expired, or the record cannot
    /// be decoded. The second element is true when an undecodable record
    /// forced a reset.
    async fn load_or_create(
        &self,
        id: &SessionId,
        auth: &UserAuth,
    ) -> Result<(Session, bool), SessionStoreError> {
        match self.store.load(id).await {
            Ok(Some(session))
                if !session.is_expired(self.retention_hours, &Timestamp::now()) =>
            {
                Ok((session, false))
            }
            Ok(Some(_)) => {
                info!(session_id = %id, "session expired, recreating");
                self.store.remove(id).await?;
                let fresh = self.create(id, auth).await?;
                Ok((fresh, false))
            }
            Ok(None) => {
                let fresh = self.create(id, auth).await?;
                Ok((fresh, false))
            }
            Err(SessionStoreError::Undecodable(_)) => {
                warn!(session_id = %id, "undecodable session record, resetting");
                let fresh = self.create(id, auth).await?;
                Ok((fresh, true))
            }
            Err(other) => Err(other),
        }
    }

    async fn create(&self, id: &SessionId, auth: &UserAuth) -> Result<Session, SessionStoreError> {
        let fresh = Session::new(id.clone(), auth.clone());
        self.store.upsert(&fresh).await?;
        Ok(fresh)
    }

    async fn lock_for(&self, id: &SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(id.clone()).or_default())
    }
}
