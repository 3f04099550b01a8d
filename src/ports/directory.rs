//! Directory Port - Interface for the buyer's saved addresses and the
//! site's industry list, used by the final stage.

use async_trait::async_trait;

use crate::domain::foundation::UserAuth;
use crate::domain::session::{AddressRecord, IndustryRecord};

use super::product_lookup::LookupError;

/// Port for address and industry lookups.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Fetches the delivery addresses saved on the buyer's account.
    async fn addresses_for(&self, auth: &UserAuth) -> Result<Vec<AddressRecord>, LookupError>;

    /// Fetches the industries configured on the site.
    async fn industries(&self) -> Result<Vec<IndustryRecord>, LookupError>;
}
