// Data system descriptors: which MLS feeds this endpoint serves.

use crate::error::Error;
use crate::query::ODataQuery;
use crate::resource::{Resource, ResourceClient};
use crate::types::ODataPage;

/// Marker for the `DataSystem` entity set, keyed by `DataSystemKey`.
#[derive(Debug)]
pub enum DataSystem {}

impl Resource for DataSystem {
    const ENTITY_SET: &'static str = "DataSystem";
}

pub type DataSystemClient = ResourceClient<DataSystem>;

impl ResourceClient<DataSystem> {
    /// First ten data systems; enough to describe the service.
    pub async fn system_info(&self) -> Result<ODataPage, Error> {
        self.list(&ODataQuery::new().top(10)).await
    }
}
