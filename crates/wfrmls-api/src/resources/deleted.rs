// Deleted-record feed used to keep replicas in step.
//
// The multi-resource sync issues one request per resource type, in
// order, and tolerates individual failures so a replica still gets
// whatever could be fetched.

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::{debug, warn};

use crate::error::Error;
use crate::query::{DateBound, ODataQuery, date_clause, eq_clause};
use crate::resource::{Resource, ResourceClient};
use crate::types::{ODataPage, Record};

/// Marker for the `Deleted` entity set, keyed by `DeletedKey`.
#[derive(Debug)]
pub enum Deleted {}

impl Resource for Deleted {
    const ENTITY_SET: &'static str = "Deleted";
    const MODIFIED_FIELD: &'static str = "DeletedDateTime";
}

pub type DeletedClient = ResourceClient<Deleted>;

/// Entity sets that can appear in the deleted feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum ResourceName {
    Property,
    Member,
    Office,
    OpenHouse,
    Media,
    HistoryTransactional,
    PropertyGreenVerification,
    PropertyUnitTypes,
    Adu,
}

/// Types checked by [`DeletedClient::all_deleted_for_sync`] when none are given.
pub const DEFAULT_SYNC_RESOURCES: [ResourceName; 5] = [
    ResourceName::Property,
    ResourceName::Member,
    ResourceName::Office,
    ResourceName::Media,
    ResourceName::OpenHouse,
];

// ── Result shapes ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncInfo {
    pub total_deleted_records: usize,
    pub resource_types_checked: usize,
    pub since_timestamp: String,
    pub resources_with_deletions: usize,
}

/// Deletions across several resource types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionSync {
    /// Every record, in resource-type order.
    pub value: Vec<Record>,
    /// Records per resource type; a failed type maps to an empty list.
    pub by_resource: IndexMap<String, Vec<Record>>,
    pub sync_info: SyncInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionCounts {
    pub total_deletions: usize,
    pub resource_types_affected: usize,
    pub by_resource_count: IndexMap<String, usize>,
    /// Latest `DeletedDateTime` seen per resource type.
    pub by_resource_latest: IndexMap<String, String>,
    pub since: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionSummary {
    pub value: Vec<Record>,
    pub summary: DeletionCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityStatus {
    Alert,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionActivity {
    pub monitoring_period_hours: u32,
    pub summary: DeletionCounts,
    pub alerts: Vec<String>,
    pub recommendations: Vec<String>,
    pub status: ActivityStatus,
    pub monitoring_timestamp: DateTime<Utc>,
}

// ── Pure aggregation ────────────────────────────────────────────────

/// Count records per `ResourceName` and track the latest deletion time.
pub fn count_deletions(records: &[Record], since: &str) -> DeletionCounts {
    let mut by_resource_count: IndexMap<String, usize> = IndexMap::new();
    let mut by_resource_latest: IndexMap<String, String> = IndexMap::new();

    for record in records {
        let resource = record
            .get("ResourceName")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown")
            .to_owned();

        *by_resource_count.entry(resource.clone()).or_default() += 1;

        if let Some(deleted_at) = record.get("DeletedDateTime").and_then(|v| v.as_str()) {
            let latest = by_resource_latest.entry(resource).or_default();
            if deleted_at > latest.as_str() {
                deleted_at.clone_into(latest);
            }
        }
    }

    DeletionCounts {
        total_deletions: records.len(),
        resource_types_affected: by_resource_count.len(),
        by_resource_count,
        by_resource_latest,
        since: since.to_owned(),
    }
}

/// Threshold checks and recommendations over a deletion summary.
pub fn assess_activity(
    counts: DeletionCounts,
    hours_back: u32,
    alert_threshold: usize,
    now: DateTime<Utc>,
) -> DeletionActivity {
    let mut alerts = Vec::new();
    let mut recommendations = Vec::new();
    let total = counts.total_deletions;

    if total > alert_threshold {
        alerts.push(format!(
            "High deletion volume: {total} records deleted in {hours_back} hours"
        ));
    }

    let per_resource_threshold = alert_threshold
        .checked_div(counts.by_resource_count.len())
        .unwrap_or(alert_threshold);
    for (resource, &count) in &counts.by_resource_count {
        if count > per_resource_threshold {
            alerts.push(format!("High {resource} deletions: {count} records"));
        }
    }

    if total > 0 {
        recommendations.push(
            "Consider running data integrity checks after bulk deletions".to_owned(),
        );
    }
    if counts.by_resource_count.get("Property").is_some_and(|&n| n > 10) {
        recommendations.push("Review property deletion patterns for market analysis".to_owned());
    }
    if counts.by_resource_count.get("Media").is_some_and(|&n| n > 50) {
        recommendations.push("Check for orphaned media cleanup processes".to_owned());
    }

    let status = if alerts.is_empty() {
        ActivityStatus::Normal
    } else {
        ActivityStatus::Alert
    };

    DeletionActivity {
        monitoring_period_hours: hours_back,
        summary: counts,
        alerts,
        recommendations,
        status,
        monitoring_timestamp: now,
    }
}

// ── Client ───────────────────────────────────────────────────────────

impl ResourceClient<Deleted> {
    pub async fn by_resource(
        &self,
        resource: ResourceName,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("ResourceName", resource.as_ref()), query)
            .await
    }

    /// `DeletedDateTime gt '...'`
    pub async fn since(
        &self,
        since: impl Into<DateBound>,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.for_resource_since(since, None, query).await
    }

    /// Deletions after `since`, optionally restricted to one resource type.
    pub async fn for_resource_since(
        &self,
        since: impl Into<DateBound>,
        resource: Option<ResourceName>,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        let mut clause = date_clause("DeletedDateTime", "gt", &since.into());
        if let Some(resource) = resource {
            clause = format!("{clause} and {}", eq_clause("ResourceName", resource.as_ref()));
        }
        self.filtered(&clause, query).await
    }

    /// Deleted records for each resource type since `since`.
    ///
    /// Types are fetched one after another. A type whose request fails is
    /// logged and recorded with no records; the others are unaffected.
    pub async fn all_deleted_for_sync(
        &self,
        since: impl Into<DateBound>,
        resource_types: Option<&[ResourceName]>,
        query: &ODataQuery,
    ) -> DeletionSync {
        let since = since.into();
        let resource_types = resource_types.unwrap_or(&DEFAULT_SYNC_RESOURCES);

        let mut value = Vec::new();
        let mut by_resource = IndexMap::with_capacity(resource_types.len());

        for &resource in resource_types {
            let records = match self
                .for_resource_since(since.clone(), Some(resource), query.clone())
                .await
            {
                Ok(page) => page.value,
                Err(e) => {
                    warn!(resource = %resource, error = %e, "deleted-record fetch failed");
                    Vec::new()
                }
            };
            debug!(resource = %resource, count = records.len(), "deleted records");
            value.extend(records.iter().cloned());
            by_resource.insert(resource.to_string(), records);
        }

        let resources_with_deletions = by_resource.values().filter(|r| !r.is_empty()).count();

        DeletionSync {
            sync_info: SyncInfo {
                total_deleted_records: value.len(),
                resource_types_checked: resource_types.len(),
                since_timestamp: since.to_odata(),
                resources_with_deletions,
            },
            value,
            by_resource,
        }
    }

    /// Per-resource counts for deletions after `since`.
    pub async fn deletion_summary(
        &self,
        since: impl Into<DateBound>,
        query: ODataQuery,
    ) -> Result<DeletionSummary, Error> {
        let since = since.into();
        let page = self.since(since.clone(), query).await?;
        let summary = count_deletions(&page.value, &since.to_odata());
        Ok(DeletionSummary {
            value: page.value,
            summary,
        })
    }

    /// Flag unusual deletion volume over the `hours_back` hours before `now`.
    pub async fn monitor_deletion_activity(
        &self,
        now: DateTime<Utc>,
        hours_back: u32,
        alert_threshold: usize,
        query: ODataQuery,
    ) -> Result<DeletionActivity, Error> {
        let cutoff = now - Duration::hours(i64::from(hours_back));
        let summary = self.deletion_summary(cutoff, query).await?;
        Ok(assess_activity(summary.summary, hours_back, alert_threshold, now))
    }
}
