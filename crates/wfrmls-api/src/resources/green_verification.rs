// Green building certifications attached to listings.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::Error;
use crate::query::{ODataQuery, eq_clause};
use crate::resource::{Resource, ResourceClient};
use crate::types::ODataPage;

/// Marker for the `PropertyGreenVerification` entity set, keyed by
/// `GreenBuildingVerificationKey`.
#[derive(Debug)]
pub enum GreenVerification {}

impl Resource for GreenVerification {
    const ENTITY_SET: &'static str = "PropertyGreenVerification";
}

pub type GreenVerificationClient = ResourceClient<GreenVerification>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum GreenVerificationType {
    #[strum(serialize = "Energy Star")]
    #[serde(rename = "Energy Star")]
    EnergyStar,
    #[strum(serialize = "LEED")]
    #[serde(rename = "LEED")]
    Leed,
    #[strum(serialize = "Green Building")]
    #[serde(rename = "Green Building")]
    GreenBuilding,
    #[strum(serialize = "HERS")]
    #[serde(rename = "HERS")]
    Hers,
    Other,
}

impl ResourceClient<GreenVerification> {
    pub async fn for_listing(
        &self,
        listing_key: &str,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("ListingKey", listing_key), query)
            .await
    }

    pub async fn by_type(
        &self,
        kind: GreenVerificationType,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(
            &eq_clause("GreenBuildingVerificationType", kind.as_ref()),
            query,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn multi_word_types_use_display_names() {
        assert_eq!(GreenVerificationType::EnergyStar.as_ref(), "Energy Star");
        assert_eq!(
            "Green Building".parse::<GreenVerificationType>().unwrap(),
            GreenVerificationType::GreenBuilding
        );
        assert_eq!(GreenVerificationType::Leed.to_string(), "LEED");
    }
}
