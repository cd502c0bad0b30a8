// Transaction history: closed sales, leases and status changes.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::Error;
use crate::query::{DateBound, ODataQuery, and_all, date_clause, eq_clause};
use crate::resource::{Resource, ResourceClient};
use crate::types::ODataPage;

/// Marker for the `HistoryTransactional` entity set, keyed by `HistoryTransactionalKey`.
#[derive(Debug)]
pub enum HistoryTransactional {}

impl Resource for HistoryTransactional {
    const ENTITY_SET: &'static str = "HistoryTransactional";
}

pub type HistoryClient = ResourceClient<HistoryTransactional>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum TransactionType {
    Sale,
    Lease,
    Rental,
    Auction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum HistoryStatus {
    Closed,
    Sold,
    Leased,
    Expired,
    Withdrawn,
}

/// Sales closed within `[start, end]`.
pub fn sales_between_clause(start: &DateBound, end: &DateBound) -> String {
    format!(
        "{} and {} and {}",
        eq_clause("TransactionType", TransactionType::Sale.as_ref()),
        date_clause("CloseDate", "ge", start),
        date_clause("CloseDate", "le", end),
    )
}

impl ResourceClient<HistoryTransactional> {
    pub async fn for_listing(
        &self,
        listing_key: &str,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("ListingKey", listing_key), query)
            .await
    }

    /// Inclusive `ClosePrice` bounds.
    pub async fn by_close_price_range(
        &self,
        min: Option<u64>,
        max: Option<u64>,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        let clauses = min
            .map(|min| format!("ClosePrice ge {min}"))
            .into_iter()
            .chain(max.map(|max| format!("ClosePrice le {max}")));
        match and_all(clauses) {
            Some(clause) => self.filtered(&clause, query).await,
            None => self.list(&query).await,
        }
    }

    pub async fn sales_between(
        &self,
        start: impl Into<DateBound>,
        end: impl Into<DateBound>,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        let clause = sales_between_clause(&start.into(), &end.into());
        self.filtered(&clause, query).await
    }

    /// Sales closed in the `days_back` days before `now`.
    pub async fn recent_sales(
        &self,
        now: DateTime<Utc>,
        days_back: u32,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        let cutoff = now - Duration::days(i64::from(days_back));
        let clause = format!(
            "{} and {}",
            eq_clause("TransactionType", TransactionType::Sale.as_ref()),
            date_clause("CloseDate", "ge", &cutoff.into()),
        );
        self.filtered(&clause, query).await
    }

    pub async fn by_city(&self, city: &str, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("City", city), query).await
    }

    /// `Status eq 'Closed'`
    pub async fn closed(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("Status", HistoryStatus::Closed.as_ref()), query)
            .await
    }

    pub async fn with_property(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.list(&query.expand("Property")).await
    }
}
