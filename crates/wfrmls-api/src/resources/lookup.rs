// Lookup (enumeration) values published by the server.

use crate::error::Error;
use crate::query::{ODataQuery, eq_clause};
use crate::resource::{Resource, ResourceClient};
use crate::types::ODataPage;

/// Marker for the `Lookup` entity set, keyed by `LookupKey`.
#[derive(Debug)]
pub enum Lookup {}

impl Resource for Lookup {
    const ENTITY_SET: &'static str = "Lookup";
}

pub type LookupClient = ResourceClient<Lookup>;

impl ResourceClient<Lookup> {
    pub async fn by_name(&self, lookup_name: &str, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("LookupName", lookup_name), query)
            .await
    }

    pub async fn property_types(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.by_name("PropertyType", query).await
    }

    pub async fn property_statuses(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.by_name("PropertyStatus", query).await
    }

    /// Values mapped to a RESO standard lookup value.
    pub async fn standard(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered("StandardLookupValue ne null", query).await
    }

    /// `IsActive eq true`
    pub async fn active(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered("IsActive eq true", query).await
    }

    /// Just the `LookupName` column, alphabetically.
    pub async fn names(&self) -> Result<ODataPage, Error> {
        let query = ODataQuery::new()
            .select(["LookupName"])
            .orderby("LookupName asc");
        self.list(&query).await
    }
}
