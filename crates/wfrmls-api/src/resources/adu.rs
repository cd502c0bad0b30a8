// Accessory dwelling units attached to listings.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::Error;
use crate::query::{ODataQuery, eq_clause};
use crate::resource::{Resource, ResourceClient};
use crate::types::ODataPage;

/// Marker for the `Adu` entity set, keyed by `AduKey`.
#[derive(Debug)]
pub enum Adu {}

impl Resource for Adu {
    const ENTITY_SET: &'static str = "Adu";
}

pub type AduClient = ResourceClient<Adu>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum AduType {
    Detached,
    Attached,
    #[strum(serialize = "Garage Conversion")]
    #[serde(rename = "Garage Conversion")]
    GarageConversion,
    Basement,
    Interior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum AduStatus {
    Existing,
    Permitted,
    Planned,
    #[strum(serialize = "Under Construction")]
    #[serde(rename = "Under Construction")]
    UnderConstruction,
}

impl ResourceClient<Adu> {
    pub async fn for_listing(
        &self,
        listing_key: &str,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("ListingKey", listing_key), query)
            .await
    }

    pub async fn by_type(&self, kind: AduType, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("AduType", kind.as_ref()), query)
            .await
    }

    pub async fn by_status(
        &self,
        status: AduStatus,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("AduStatus", status.as_ref()), query)
            .await
    }

    pub async fn existing(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.by_status(AduStatus::Existing, query).await
    }

    pub async fn permitted(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.by_status(AduStatus::Permitted, query).await
    }

    pub async fn with_property(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.list(&query.expand("Property")).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn multi_word_values_keep_their_spaces() {
        assert_eq!(AduStatus::UnderConstruction.as_ref(), "Under Construction");
        assert_eq!(
            "Under Construction".parse::<AduStatus>().unwrap(),
            AduStatus::UnderConstruction
        );
        assert_eq!(AduType::GarageConversion.as_ref(), "Garage Conversion");
    }
}
