// The `Resource` entity set: metadata about the other entity sets.

use crate::error::Error;
use crate::query::{ODataQuery, eq_clause};
use crate::resource::{Resource, ResourceClient};
use crate::types::ODataPage;

/// Marker for the `Resource` entity set, keyed by `ResourceName`.
#[derive(Debug)]
pub enum ResourceInfo {}

impl Resource for ResourceInfo {
    const ENTITY_SET: &'static str = "Resource";
}

pub type ResourceInfoClient = ResourceClient<ResourceInfo>;

impl ResourceClient<ResourceInfo> {
    pub async fn by_name(
        &self,
        resource_name: &str,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("ResourceName", resource_name), query)
            .await
    }

    /// Resources mapped to a RESO standard name.
    pub async fn standard(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered("StandardName ne null", query).await
    }

    pub async fn with_fields(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.list(&query.expand("Fields")).await
    }
}
