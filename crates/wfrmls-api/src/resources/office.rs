// Brokerage offices.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::Error;
use crate::query::{ODataQuery, eq_clause, quote};
use crate::resource::{Resource, ResourceClient};
use crate::types::ODataPage;

/// Marker for the `Office` entity set, keyed by `OfficeKey`.
#[derive(Debug)]
pub enum Office {}

impl Resource for Office {
    const ENTITY_SET: &'static str = "Office";
}

pub type OfficeClient = ResourceClient<Office>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum OfficeStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum OfficeType {
    Main,
    Branch,
    Franchise,
}

impl ResourceClient<Office> {
    /// `OfficeStatus eq 'Active'`
    pub async fn active(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.by_status(OfficeStatus::Active, query).await
    }

    pub async fn by_status(
        &self,
        status: OfficeStatus,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("OfficeStatus", status.as_ref()), query)
            .await
    }

    pub async fn by_type(&self, kind: OfficeType, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("OfficeType", kind.as_ref()), query)
            .await
    }

    pub async fn by_city(&self, city: &str, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("OfficeCity", city), query).await
    }

    /// Substring match on `OfficeName`.
    pub async fn by_name(&self, name: &str, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered(&format!("contains(OfficeName, {})", quote(name)), query)
            .await
    }

    pub async fn by_postal_code(
        &self,
        postal_code: &str,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("OfficePostalCode", postal_code), query)
            .await
    }

    /// Expands the office's `Member` roster.
    pub async fn with_members(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.list(&query.expand("Member")).await
    }
}
