// Per-unit breakdown for multi-unit listings.

use crate::error::Error;
use crate::query::{ODataQuery, eq_clause};
use crate::resource::{Resource, ResourceClient};
use crate::types::ODataPage;

/// Marker for the `PropertyUnitTypes` entity set, keyed by `UnitTypeKey`.
#[derive(Debug)]
pub enum PropertyUnitTypes {}

impl Resource for PropertyUnitTypes {
    const ENTITY_SET: &'static str = "PropertyUnitTypes";
}

pub type PropertyUnitTypesClient = ResourceClient<PropertyUnitTypes>;

/// Unit types counted as residential.
pub const RESIDENTIAL_UNIT_TYPES: [&str; 7] = [
    "Condo",
    "Townhome",
    "Apartment",
    "Single Family",
    "Duplex",
    "Triplex",
    "Fourplex",
];

/// `(UnitType eq 'Condo' or UnitType eq 'Townhome' or ...)`
pub fn residential_clause() -> String {
    let alternatives: Vec<String> = RESIDENTIAL_UNIT_TYPES
        .iter()
        .map(|t| eq_clause("UnitType", t))
        .collect();
    format!("({})", alternatives.join(" or "))
}

impl ResourceClient<PropertyUnitTypes> {
    pub async fn for_listing(
        &self,
        listing_key: &str,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("ListingKey", listing_key), query)
            .await
    }

    pub async fn by_unit_type(
        &self,
        unit_type: &str,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("UnitType", unit_type), query).await
    }

    pub async fn residential(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered(&residential_clause(), query).await
    }

    pub async fn with_properties(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.list(&query.expand("Property")).await
    }
}
