//! Address and industry records fetched from the buyer's account.

use serde::{Deserialize, Serialize};

/// A saved delivery address from the buyer's account.
///
/// Aliases accept the marketplace wire names; everything except the id is
/// optional on the wire and defaults to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default, alias = "addressLine")]
    pub address_line: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default, alias = "phoneNumber")]
    pub phone_number: String,

    #[serde(default, alias = "countryCode")]
    pub country_code: String,

    #[serde(default)]
    pub city: String,

    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub country: String,

    #[serde(default)]
    pub latitude: String,

    #[serde(default)]
    pub longitude: String,
}

/// An industry the purchase can be attributed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryRecord {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default, alias = "nameEn")]
    pub name_en: String,
}
