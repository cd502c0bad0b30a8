//! Client-side market analytics.
//!
//! Each report makes one or two list requests (at most one page each)
//! and aggregates in memory. The aggregation steps are plain functions
//! over records so they can be exercised without a server.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use wfrmls_api::query::{and_all, date_clause, eq_clause};
use wfrmls_api::{MAX_TOP, ODataQuery, Record, WfrmlsClient};

use crate::stats::{self, ratio, to_f64};

const TOP_AGENTS: usize = 10;
const PROPERTY_QUALITY_SAMPLE: u32 = 50;
const MEMBER_QUALITY_SAMPLE: u32 = 30;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("No valid property data found for {analysis}")]
    NoData { analysis: &'static str },

    #[error(transparent)]
    Api(#[from] wfrmls_api::Error),
}

// ── Report shapes ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSummary {
    pub market_area: String,
    pub property_type: String,
    pub analysis_period_days: u32,
    pub timestamp: DateTime<Utc>,
    pub inventory: Inventory,
    pub pricing: PriceStats,
    pub activity: Activity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inventory {
    pub active_listings: usize,
    pub new_listings: usize,
    /// New listings per day over the period.
    pub new_listings_rate: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriceStats {
    pub average_price: f64,
    pub median_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub price_range: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub avg_days_on_market: f64,
    pub properties_analyzed: usize,
    /// Turnover per month.
    pub market_velocity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTrends {
    pub market_area: String,
    pub property_type: String,
    pub analysis_period_days: u32,
    pub properties_analyzed: usize,
    pub timestamp: DateTime<Utc>,
    pub overall_pricing: OverallPricing,
    pub price_segments: Vec<PriceSegment>,
    pub market_insights: MarketInsights,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallPricing {
    pub average_price: f64,
    pub median_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub avg_price_per_sqft: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSegment {
    pub name: String,
    pub min_price: f64,
    pub max_price: f64,
    pub avg_price: f64,
    pub count: usize,
    /// Percentage of all priced listings.
    pub market_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketInsights {
    pub luxury_threshold: f64,
    pub affordable_threshold: f64,
    pub price_diversity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStats {
    pub name: String,
    pub member_key: String,
    pub listing_count: usize,
    pub total_value: f64,
    pub avg_price: f64,
    pub active_listings: usize,
    pub pending_listings: usize,
    pub email: String,
    pub office_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentPerformance {
    pub analysis_period_days: u32,
    pub min_listings_threshold: usize,
    pub total_agents_analyzed: usize,
    pub total_listings_analyzed: usize,
    pub timestamp: DateTime<Utc>,
    pub summary: AgentSummary,
    pub top_agents: TopAgents,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSummary {
    pub avg_listings_per_agent: f64,
    pub avg_listing_value: f64,
    pub total_market_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopAgents {
    pub by_listings: Vec<AgentStats>,
    pub by_total_value: Vec<AgentStats>,
    pub by_avg_price: Vec<AgentStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityStatus {
    Good,
    Fair,
    NeedsAttention,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub timestamp: DateTime<Utc>,
    pub overall_quality_score: f64,
    pub property_quality: PropertyQuality,
    pub member_quality: MemberQuality,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub status: QualityStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyQuality {
    pub total_analyzed: usize,
    pub completeness_score: f64,
    pub missing_prices: usize,
    pub missing_cities: usize,
    pub missing_bedrooms: usize,
    pub missing_square_footage: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberQuality {
    pub total_analyzed: usize,
    pub completeness_score: f64,
    pub missing_emails: usize,
}

// ── Record helpers ───────────────────────────────────────────────────

fn number(record: &Record, field: &str) -> Option<f64> {
    record.get(field).and_then(Value::as_f64)
}

fn string(record: &Record, field: &str) -> String {
    record
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

/// Absent, null, empty string, zero or `false`.
fn is_blank(record: &Record, field: &str) -> bool {
    match record.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|x| x.abs() < f64::EPSILON),
        Some(Value::Bool(b)) => !b,
        Some(_) => false,
    }
}

/// Positive `ListPrice` values.
pub fn positive_prices(records: &[Record]) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| number(r, "ListPrice"))
        .filter(|&p| p > 0.0)
        .collect()
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

/// Whole days since `ListingContractDate` for each record that has one.
pub fn days_on_market(records: &[Record], now: DateTime<Utc>) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| r.get("ListingContractDate").and_then(Value::as_str))
        .filter_map(parse_date)
        .filter_map(|listed| u32::try_from((now - listed).num_days()).ok())
        .map(f64::from)
        .collect()
}

pub fn price_stats(prices: &[f64]) -> PriceStats {
    let min_price = stats::min(prices).unwrap_or(0.0);
    let max_price = stats::max(prices).unwrap_or(0.0);
    PriceStats {
        average_price: stats::mean(prices).unwrap_or(0.0),
        median_price: stats::median(prices).unwrap_or(0.0),
        min_price,
        max_price,
        price_range: max_price - min_price,
    }
}

/// `30 / avg_dom`, or 0 when there is no average.
pub fn market_velocity(avg_dom: f64) -> f64 {
    if avg_dom > 0.0 { 30.0 / avg_dom } else { 0.0 }
}

/// Split sorted prices into `segments` equal runs; the remainder goes to the last.
///
/// With three or fewer segments they are named Budget / Mid-Range / Luxury.
pub fn segment_prices(sorted: &[f64], segments: usize) -> Vec<PriceSegment> {
    const NAMES: [&str; 3] = ["Budget", "Mid-Range", "Luxury"];
    let segments = segments.max(1);
    let size = sorted.len() / segments;

    (0..segments)
        .filter_map(|i| {
            let start = i * size;
            let end = if i + 1 < segments { start + size } else { sorted.len() };
            let slice = sorted.get(start..end).filter(|s| !s.is_empty())?;
            let name = if segments <= 3 {
                NAMES.get(i).map_or_else(|| format!("Segment {}", i + 1), |n| (*n).to_owned())
            } else {
                format!("Segment {}", i + 1)
            };
            Some(PriceSegment {
                name,
                min_price: stats::min(slice)?,
                max_price: stats::max(slice)?,
                avg_price: stats::mean(slice)?,
                count: slice.len(),
                market_share: ratio(slice.len(), sorted.len()) * 100.0,
            })
        })
        .collect()
}

/// Luxury / affordable cut-offs at the 80th / 20th positions, plus spread.
pub fn market_insights(sorted: &[f64]) -> Option<MarketInsights> {
    let min = *sorted.first()?;
    let max = *sorted.last()?;
    let n = sorted.len();
    let (luxury, affordable) = if n > 5 {
        (*sorted.get(n * 4 / 5)?, *sorted.get(n / 5)?)
    } else {
        (max, min)
    };
    let avg = stats::mean(sorted)?;
    Some(MarketInsights {
        luxury_threshold: luxury,
        affordable_threshold: affordable,
        price_diversity_score: if avg > 0.0 { (max - min) / avg } else { 0.0 },
    })
}

/// Mean price per square foot over records with both values positive.
pub fn avg_price_per_sqft(records: &[Record]) -> f64 {
    let per_sqft: Vec<f64> = records
        .iter()
        .filter_map(|r| Some((number(r, "ListPrice")?, number(r, "LivingArea")?)))
        .filter(|&(price, area)| price > 0.0 && area > 0.0)
        .map(|(price, area)| price / area)
        .collect();
    stats::mean(&per_sqft).unwrap_or(0.0)
}

/// Join listings (with expanded `Member`) to active members and rank agents.
pub fn rank_agents(
    listings: &[Record],
    members: &[Record],
    min_listings: usize,
) -> Vec<AgentStats> {
    let lookup: BTreeMap<String, &Record> = members
        .iter()
        .filter_map(|m| Some((m.get("MemberKey")?.as_str()?.to_owned(), m)))
        .collect();

    let mut by_agent: BTreeMap<String, AgentStats> = BTreeMap::new();
    for listing in listings {
        let Some(key) = listing
            .get("Member")
            .and_then(Value::as_object)
            .and_then(|m| m.get("MemberKey"))
            .and_then(Value::as_str)
        else {
            continue;
        };
        let Some(member) = lookup.get(key) else {
            continue;
        };

        let stats = by_agent.entry(key.to_owned()).or_insert_with(|| AgentStats {
            name: member
                .get("MemberFullName")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_owned(),
            member_key: key.to_owned(),
            listing_count: 0,
            total_value: 0.0,
            avg_price: 0.0,
            active_listings: 0,
            pending_listings: 0,
            email: string(member, "MemberEmail"),
            office_key: string(member, "OfficeKey"),
        });
        stats.listing_count += 1;
        stats.total_value += number(listing, "ListPrice").unwrap_or(0.0);
        match listing.get("StandardStatus").and_then(Value::as_str) {
            Some("Active") => stats.active_listings += 1,
            Some("Pending") => stats.pending_listings += 1,
            _ => {}
        }
    }

    by_agent
        .into_values()
        .filter(|s| s.listing_count >= min_listings && s.listing_count > 0)
        .map(|mut s| {
            s.avg_price = s.total_value / to_f64(s.listing_count);
            s
        })
        .collect()
}

fn top_by(agents: &[AgentStats], key: impl Fn(&AgentStats) -> f64) -> Vec<AgentStats> {
    let mut sorted = agents.to_vec();
    sorted.sort_by(|a, b| key(b).total_cmp(&key(a)));
    sorted.truncate(TOP_AGENTS);
    sorted
}

/// Completeness scores, issues and recommendations over sampled records.
pub fn assess_data_quality(
    properties: &[Record],
    members: &[Record],
    now: DateTime<Utc>,
) -> DataQualityReport {
    let count = |records: &[Record], field: &str| {
        records.iter().filter(|r| is_blank(r, field)).count()
    };

    let total_properties = properties.len();
    let missing_prices = count(properties, "ListPrice");
    let missing_cities = count(properties, "City");
    let missing_bedrooms = count(properties, "BedroomsTotal");
    let missing_square_footage = count(properties, "LivingArea");
    let property_completeness = if total_properties == 0 {
        1.0
    } else {
        1.0 - ratio(
            missing_prices + missing_cities + missing_bedrooms + missing_square_footage,
            total_properties * 4,
        )
    };

    let total_members = members.len();
    let missing_emails = count(members, "MemberEmail");
    let member_completeness = if total_members == 0 {
        1.0
    } else {
        1.0 - ratio(missing_emails, total_members)
    };

    let mut issues = Vec::new();
    let mut recommendations = Vec::new();
    if to_f64(missing_prices) > to_f64(total_properties) * 0.1 {
        issues.push(format!(
            "High missing price data: {missing_prices}/{total_properties} properties"
        ));
        recommendations.push("Review price data entry processes".to_owned());
    }
    if to_f64(missing_cities) > to_f64(total_properties) * 0.05 {
        issues.push(format!(
            "Missing city data: {missing_cities}/{total_properties} properties"
        ));
        recommendations.push("Improve location data validation".to_owned());
    }
    if to_f64(missing_emails) > to_f64(total_members) * 0.2 {
        issues.push(format!(
            "High missing email data: {missing_emails}/{total_members} members"
        ));
        recommendations.push("Update member contact information requirements".to_owned());
    }

    let overall = (property_completeness + member_completeness) / 2.0;
    let status = if overall > 0.9 {
        QualityStatus::Good
    } else if overall > 0.7 {
        QualityStatus::Fair
    } else {
        QualityStatus::NeedsAttention
    };

    DataQualityReport {
        timestamp: now,
        overall_quality_score: overall,
        property_quality: PropertyQuality {
            total_analyzed: total_properties,
            completeness_score: property_completeness,
            missing_prices,
            missing_cities,
            missing_bedrooms,
            missing_square_footage,
        },
        member_quality: MemberQuality {
            total_analyzed: total_members,
            completeness_score: member_completeness,
            missing_emails,
        },
        issues,
        recommendations,
        status,
    }
}

// ── Analytics ────────────────────────────────────────────────────────

/// `StandardStatus eq 'Active'` plus optional city / type clauses.
fn active_filter(city: Option<&str>, property_type: Option<&str>) -> String {
    let mut clauses = vec![eq_clause("StandardStatus", "Active")];
    clauses.extend(city.map(|c| eq_clause("City", c)));
    clauses.extend(property_type.map(|t| eq_clause("PropertyType", t)));
    and_all(clauses).unwrap_or_default()
}

fn cutoff(now: DateTime<Utc>, days_back: u32) -> DateTime<Utc> {
    now - TimeDelta::days(i64::from(days_back))
}

#[derive(Debug, Clone, Copy)]
pub struct Analytics<'a> {
    client: &'a WfrmlsClient,
}

impl<'a> Analytics<'a> {
    pub fn new(client: &'a WfrmlsClient) -> Self {
        Self { client }
    }

    pub async fn market_summary(
        &self,
        city: Option<&str>,
        days_back: u32,
        property_type: Option<&str>,
    ) -> Result<MarketSummary, AnalyticsError> {
        let now = Utc::now();
        let base = active_filter(city, property_type);
        let new_filter = format!(
            "{base} and {}",
            date_clause("ListingContractDate", "gt", &cutoff(now, days_back).into())
        );

        let active = self
            .client
            .property()
            .list(&ODataQuery::new().filter(base).top(MAX_TOP))
            .await?;
        let new = self
            .client
            .property()
            .list(&ODataQuery::new().filter(new_filter).top(MAX_TOP))
            .await?;

        let pricing = price_stats(&positive_prices(&active.value));
        let dom = days_on_market(&active.value, now);
        let avg_dom = stats::mean(&dom).unwrap_or(0.0);

        Ok(MarketSummary {
            market_area: city.unwrap_or("All Areas").to_owned(),
            property_type: property_type.unwrap_or("All Types").to_owned(),
            analysis_period_days: days_back,
            timestamp: now,
            inventory: Inventory {
                active_listings: active.len(),
                new_listings: new.len(),
                new_listings_rate: ratio(
                    new.len(),
                    usize::try_from(days_back).unwrap_or(usize::MAX),
                ),
            },
            pricing,
            activity: Activity {
                avg_days_on_market: avg_dom,
                properties_analyzed: dom.len(),
                market_velocity: market_velocity(avg_dom),
            },
        })
    }

    pub async fn price_trends(
        &self,
        city: Option<&str>,
        days_back: u32,
        property_type: Option<&str>,
        segments: usize,
    ) -> Result<PriceTrends, AnalyticsError> {
        let query = ODataQuery::new()
            .filter(active_filter(city, property_type))
            .top(MAX_TOP)
            .select([
                "ListPrice",
                "BedroomsTotal",
                "BathroomsTotalInteger",
                "LivingArea",
                "ListingContractDate",
            ]);
        let page = self.client.property().list(&query).await?;

        let valid: Vec<Record> = page
            .value
            .into_iter()
            .filter(|r| number(r, "ListPrice").is_some_and(|p| p > 0.0))
            .collect();
        let mut prices = positive_prices(&valid);
        prices.sort_by(f64::total_cmp);

        let insights = market_insights(&prices).ok_or(AnalyticsError::NoData {
            analysis: "price trend analysis",
        })?;
        let overall = price_stats(&prices);

        Ok(PriceTrends {
            market_area: city.unwrap_or("All Areas").to_owned(),
            property_type: property_type.unwrap_or("All Types").to_owned(),
            analysis_period_days: days_back,
            properties_analyzed: valid.len(),
            timestamp: Utc::now(),
            overall_pricing: OverallPricing {
                average_price: overall.average_price,
                median_price: overall.median_price,
                min_price: overall.min_price,
                max_price: overall.max_price,
                avg_price_per_sqft: avg_price_per_sqft(&valid),
            },
            price_segments: segment_prices(&prices, segments),
            market_insights: insights,
        })
    }

    pub async fn agent_performance(
        &self,
        days_back: u32,
        min_listings: usize,
    ) -> Result<AgentPerformance, AnalyticsError> {
        let now = Utc::now();
        let listings_query = ODataQuery::new()
            .filter(date_clause("ListingContractDate", "gt", &cutoff(now, days_back).into()))
            .expand("Member")
            .top(MAX_TOP)
            .select(["ListingId", "ListPrice", "StandardStatus", "ListingContractDate"]);
        let members_query = ODataQuery::new()
            .filter(eq_clause("MemberStatus", "Active"))
            .top(MAX_TOP)
            .select(["MemberKey", "MemberFullName", "MemberEmail", "OfficeKey"]);

        let listings = self.client.property().list(&listings_query).await?;
        let members = self.client.member().list(&members_query).await?;

        let agents = rank_agents(&listings.value, &members.value, min_listings);
        let counts: Vec<f64> = agents.iter().map(|a| to_f64(a.listing_count)).collect();
        let averages: Vec<f64> = agents.iter().map(|a| a.avg_price).collect();

        Ok(AgentPerformance {
            analysis_period_days: days_back,
            min_listings_threshold: min_listings,
            total_agents_analyzed: agents.len(),
            total_listings_analyzed: listings.len(),
            timestamp: now,
            summary: AgentSummary {
                avg_listings_per_agent: stats::mean(&counts).unwrap_or(0.0),
                avg_listing_value: stats::mean(&averages).unwrap_or(0.0),
                total_market_value: agents.iter().map(|a| a.total_value).sum(),
            },
            top_agents: TopAgents {
                by_listings: top_by(&agents, |a| to_f64(a.listing_count)),
                by_total_value: top_by(&agents, |a| a.total_value),
                by_avg_price: top_by(&agents, |a| a.avg_price),
            },
        })
    }

    pub async fn data_quality(&self) -> Result<DataQualityReport, AnalyticsError> {
        let properties = self
            .client
            .property()
            .list(&ODataQuery::new().top(PROPERTY_QUALITY_SAMPLE).select([
                "ListingId",
                "ListPrice",
                "StandardStatus",
                "City",
                "BedroomsTotal",
                "LivingArea",
                "ListingContractDate",
            ]))
            .await?;
        let members = self
            .client
            .member()
            .list(&ODataQuery::new().top(MEMBER_QUALITY_SAMPLE).select([
                "MemberKey",
                "MemberFullName",
                "MemberEmail",
                "MemberStatus",
            ]))
            .await?;

        Ok(assess_data_quality(&properties.value, &members.value, Utc::now()))
    }
}
