// Members: agents, brokers and assistants.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::Error;
use crate::query::{ODataQuery, and_all, eq_clause, quote};
use crate::resource::{Resource, ResourceClient};
use crate::types::ODataPage;

/// Marker for the `Member` entity set, keyed by `MemberKey`.
#[derive(Debug)]
pub enum Member {}

impl Resource for Member {
    const ENTITY_SET: &'static str = "Member";
}

pub type MemberClient = ResourceClient<Member>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum MemberStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum MemberType {
    Agent,
    Broker,
    Assistant,
}

/// `contains(MemberFirstName, '..') and contains(MemberLastName, '..')`
pub fn name_clause(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let mut clauses = Vec::new();
    if let Some(first) = first {
        clauses.push(format!("contains(MemberFirstName, {})", quote(first)));
    }
    if let Some(last) = last {
        clauses.push(format!("contains(MemberLastName, {})", quote(last)));
    }
    and_all(clauses)
}

impl ResourceClient<Member> {
    /// `MemberStatus eq 'Active'`
    pub async fn active(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.by_status(MemberStatus::Active, query).await
    }

    pub async fn by_status(
        &self,
        status: MemberStatus,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("MemberStatus", status.as_ref()), query)
            .await
    }

    pub async fn by_type(&self, kind: MemberType, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("MemberType", kind.as_ref()), query)
            .await
    }

    pub async fn by_office(&self, office_key: &str, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("OfficeKey", office_key), query).await
    }

    /// Substring match on first and/or last name.
    pub async fn by_name(
        &self,
        first: Option<&str>,
        last: Option<&str>,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        match name_clause(first, last) {
            Some(clause) => self.filtered(&clause, query).await,
            None => self.list(&query).await,
        }
    }

    /// Expands the member's `Office`.
    pub async fn with_office(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.list(&query.expand("Office")).await
    }
}
