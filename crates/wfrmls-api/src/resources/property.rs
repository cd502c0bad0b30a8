// Property listings: the main entity set.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::Error;
use crate::query::{DateBound, ODataQuery, and_all, date_clause, eq_clause};
use crate::resource::{Resource, ResourceClient};
use crate::types::ODataPage;

/// Marker for the `Property` entity set, keyed by `ListingKey`.
#[derive(Debug)]
pub enum Property {}

impl Resource for Property {
    const ENTITY_SET: &'static str = "Property";
}

pub type PropertyClient = ResourceClient<Property>;

/// Default floor for [`PropertyClient::luxury`].
pub const DEFAULT_LUXURY_PRICE: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum PropertyStatus {
    Active,
    Pending,
    Sold,
    Expired,
    Withdrawn,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum PropertyType {
    Residential,
    Commercial,
    Land,
    Rental,
}

/// Multi-criteria search; every set field becomes one AND-ed clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySearch {
    pub status: Option<PropertyStatus>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub school_district: Option<String>,
    pub property_type: Option<PropertyType>,
    pub min_bedrooms: Option<u32>,
    pub min_bathrooms: Option<u32>,
    pub min_living_area: Option<u32>,
}

impl PropertySearch {
    /// The combined clause, or `None` if no criteria are set.
    pub fn to_filter(&self) -> Option<String> {
        let mut clauses = Vec::new();
        if let Some(status) = self.status {
            clauses.push(eq_clause("StandardStatus", status.as_ref()));
        }
        if let Some(min) = self.min_price {
            clauses.push(format!("ListPrice ge {min}"));
        }
        if let Some(max) = self.max_price {
            clauses.push(format!("ListPrice le {max}"));
        }
        if let Some(city) = &self.city {
            clauses.push(eq_clause("City", city));
        }
        if let Some(zip) = &self.postal_code {
            clauses.push(eq_clause("PostalCode", zip));
        }
        if let Some(district) = &self.school_district {
            clauses.push(eq_clause("SchoolDistrict", district));
        }
        if let Some(kind) = self.property_type {
            clauses.push(eq_clause("PropertyType", kind.as_ref()));
        }
        if let Some(beds) = self.min_bedrooms {
            clauses.push(format!("BedroomsTotal ge {beds}"));
        }
        if let Some(baths) = self.min_bathrooms {
            clauses.push(format!("BathroomsTotalInteger ge {baths}"));
        }
        if let Some(area) = self.min_living_area {
            clauses.push(format!("LivingArea ge {area}"));
        }
        and_all(clauses)
    }
}

/// `ListPrice ge {min} and ListPrice le {max}`, either side optional.
pub fn price_range_clause(min: Option<u64>, max: Option<u64>) -> Option<String> {
    let mut clauses = Vec::new();
    if let Some(min) = min {
        clauses.push(format!("ListPrice ge {min}"));
    }
    if let Some(max) = max {
        clauses.push(format!("ListPrice le {max}"));
    }
    and_all(clauses)
}

/// `geo.intersects(...)` over a closed `POLYGON` ring of `(lat, lng)` points.
pub fn polygon_clause(points: &[(f64, f64)]) -> Option<String> {
    let (first, _) = points.split_first()?;
    let mut ring: Vec<String> = points.iter().map(|(lat, lng)| format!("{lat} {lng}")).collect();
    if points.last() != Some(first) {
        ring.push(format!("{} {}", first.0, first.1));
    }
    Some(format!(
        "geo.intersects(Latitude, Longitude, geography'POLYGON(({}))')",
        ring.join(", ")
    ))
}

/// City part of a `"street, city, state zip"` address.
fn city_from_address(address: &str) -> Option<&str> {
    let parts: Vec<&str> = address.split(',').map(str::trim).collect();
    if parts.len() < 2 {
        return None;
    }
    parts
        .get(parts.len() - 2)
        .copied()
        .filter(|city| !city.is_empty())
}

impl ResourceClient<Property> {
    /// `StandardStatus eq 'Active'`
    pub async fn active(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.by_status(PropertyStatus::Active, query).await
    }

    pub async fn by_status(
        &self,
        status: PropertyStatus,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("StandardStatus", status.as_ref()), query)
            .await
    }

    pub async fn by_type(&self, kind: PropertyType, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("PropertyType", kind.as_ref()), query)
            .await
    }

    /// Inclusive price bounds. With neither bound this is a plain list.
    pub async fn by_price_range(
        &self,
        min: Option<u64>,
        max: Option<u64>,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        match price_range_clause(min, max) {
            Some(clause) => self.filtered(&clause, query).await,
            None => self.list(&query).await,
        }
    }

    pub async fn by_city(&self, city: &str, query: ODataQuery) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("City", city), query).await
    }

    pub async fn by_postal_code(
        &self,
        postal_code: &str,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&eq_clause("PostalCode", postal_code), query)
            .await
    }

    /// Listings within `radius_miles` of a point.
    pub async fn within_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius_miles: f64,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        let clause = format!(
            "geo.distance(Latitude, Longitude, {latitude}, {longitude}) le {radius_miles}"
        );
        self.filtered(&clause, query).await
    }

    /// Listings inside a polygon given as `(lat, lng)` vertices.
    pub async fn within_polygon(
        &self,
        points: &[(f64, f64)],
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        match polygon_clause(points) {
            Some(clause) => self.filtered(&clause, query).await,
            None => self.list(&query).await,
        }
    }

    /// Expands the `Media` navigation property.
    pub async fn with_media(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.list(&query.expand("Media")).await
    }

    /// Active listings at or above `min_price`.
    pub async fn luxury(
        &self,
        min_price: Option<u64>,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        let min_price = min_price.unwrap_or(DEFAULT_LUXURY_PRICE);
        let clause = format!("ListPrice ge {min_price} and StandardStatus eq 'Active'");
        self.filtered(&clause, query).await
    }

    /// Listings whose contract date is after `since`.
    pub async fn new_listings_since(
        &self,
        since: impl Into<DateBound>,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        let clause = date_clause("ListingContractDate", "gt", &since.into());
        self.filtered(&clause, query).await
    }

    pub async fn search(
        &self,
        criteria: &PropertySearch,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        match criteria.to_filter() {
            Some(clause) => self.filtered(&clause, query).await,
            None => self.list(&query).await,
        }
    }

    /// Listings in the city named by `address`.
    ///
    /// There is no geocoder behind this: only the city component is used and
    /// `radius_miles` is recorded in the debug log. An address without a city
    /// part falls back to a plain list.
    pub async fn near_address(
        &self,
        address: &str,
        radius_miles: f64,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        tracing::debug!(address, radius_miles, "address search by city");
        match city_from_address(address) {
            Some(city) => self.by_city(city, query).await,
            None => self.list(&query).await,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn enums_render_api_strings() {
        assert_eq!(PropertyStatus::Withdrawn.as_ref(), "Withdrawn");
        assert_eq!("Land".parse::<PropertyType>().unwrap(), PropertyType::Land);
    }

    #[test]
    fn search_builds_clauses_in_order() {
        let search = PropertySearch {
            status: Some(PropertyStatus::Active),
            min_price: Some(300_000),
            max_price: Some(600_000),
            city: Some("Provo".into()),
            postal_code: Some("84604".into()),
            min_bedrooms: Some(3),
            ..PropertySearch::default()
        };
        assert_eq!(
            search.to_filter().unwrap(),
            "StandardStatus eq 'Active' and ListPrice ge 300000 and ListPrice le 600000 \
             and City eq 'Provo' and PostalCode eq '84604' and BedroomsTotal ge 3"
        );
        assert_eq!(PropertySearch::default().to_filter(), None);
    }

    #[test]
    fn price_range_either_side() {
        assert_eq!(
            price_range_clause(Some(1), None).unwrap(),
            "ListPrice ge 1"
        );
        assert_eq!(
            price_range_clause(None, Some(9)).unwrap(),
            "ListPrice le 9"
        );
        assert_eq!(price_range_clause(None, None), None);
    }

    #[test]
    fn polygon_ring_is_closed() {
        let clause = polygon_clause(&[(40.7, -111.9), (40.8, -111.9), (40.8, -111.8)]).unwrap();
        assert_eq!(
            clause,
            "geo.intersects(Latitude, Longitude, geography'POLYGON((40.7 -111.9, \
             40.8 -111.9, 40.8 -111.8, 40.7 -111.9))')"
        );
        assert_eq!(polygon_clause(&[]), None);
    }

    #[test]
    fn city_is_second_to_last_address_part() {
        assert_eq!(
            city_from_address("123 Main St, Salt Lake City, UT 84101"),
            Some("Salt Lake City")
        );
        assert_eq!(city_from_address("no commas here"), None);
    }
}
