// Open house events attached to listings.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::Error;
use crate::query::{DateBound, ODataQuery, date_clause, eq_clause};
use crate::resource::{Resource, ResourceClient};
use crate::types::ODataPage;

/// Marker for the `OpenHouse` entity set, keyed by `OpenHouseKey`.
#[derive(Debug)]
pub enum OpenHouse {}

impl Resource for OpenHouse {
    const ENTITY_SET: &'static str = "OpenHouse";
}

pub type OpenHouseClient = ResourceClient<OpenHouse>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum OpenHouseStatus {
    Active,
    Ended,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum OpenHouseType {
    Public,
    Private,
    Broker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum AttendedBy {
    Agent,
    Owner,
    None,
}

/// Start-time window `(from, from + days_ahead)`, both ends exclusive.
pub fn upcoming_clause(from: DateTime<Utc>, days_ahead: u32) -> String {
    let until = from + Duration::days(i64::from(days_ahead));
    format!(
        "{} and {}",
        date_clause("OpenHouseStartTime", "gt", &DateBound::from(from)),
        date_clause("OpenHouseStartTime", "lt", &DateBound::from(until)),
    )
}

impl ResourceClient<OpenHouse> {
    /// Open houses starting within `days_ahead` days of `from`.
    pub async fn upcoming(
        &self,
        from: DateTime<Utc>,
        days_ahead: u32,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&upcoming_clause(from, days_ahead), query).await
    }

    pub async fn for_listing(
        &self,
        listing_key: &str,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("ListingKey", listing_key), query)
            .await
    }

    pub async fn by_agent(&self, agent_key: &str, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("ShowingAgentKey", agent_key), query)
            .await
    }

    /// `OpenHouseStatus eq 'Active'`
    pub async fn active(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered(
            &eq_clause("OpenHouseStatus", OpenHouseStatus::Active.as_ref()),
            query,
        )
        .await
    }

    pub async fn with_property(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.list(&query.expand("Property")).await
    }
}
