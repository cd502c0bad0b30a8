// Photos, videos and documents attached to listings.
//
// Media rows reference their listing through the numeric
// `ResourceRecordKeyNumeric`, so those filters are unquoted.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::Error;
use crate::query::{MAX_TOP, ODataQuery, eq_clause};
use crate::resource::{Resource, ResourceClient};
use crate::types::{ODataPage, Record};

/// Marker for the `Media` entity set, keyed by `MediaKey`.
#[derive(Debug)]
pub enum Media {}

impl Resource for Media {
    const ENTITY_SET: &'static str = "Media";
}

pub type MediaClient = ResourceClient<Media>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum MediaType {
    Photo,
    Video,
    Document,
    VirtualTour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[derive(Serialize, Deserialize)]
pub enum MediaCategory {
    Exterior,
    Interior,
    Kitchen,
    Bathroom,
    Bedroom,
    LivingRoom,
    DiningRoom,
    Garage,
    Yard,
    Pool,
}

fn listing_clause(listing_key: u64) -> String {
    format!("ResourceRecordKeyNumeric eq {listing_key}")
}

fn photo_clause(listing_key: u64) -> String {
    format!(
        "{} and {}",
        listing_clause(listing_key),
        eq_clause("MediaType", MediaType::Photo.as_ref())
    )
}

impl ResourceClient<Media> {
    /// Every media item for one listing.
    pub async fn for_listing(
        &self,
        listing_key: u64,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&listing_clause(listing_key), query).await
    }

    pub async fn photos_for_listing(
        &self,
        listing_key: u64,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.filtered(&photo_clause(listing_key), query).await
    }

    /// The `Order eq 1` photo, if the listing has one.
    pub async fn primary_photo(&self, listing_key: u64) -> Result<Option<Record>, Error> {
        let query = ODataQuery::new().filter("Order eq 1").top(1);
        let page = self.photos_for_listing(listing_key, query).await?;
        Ok(page.value.into_iter().next())
    }

    /// `MediaURL` of each item in display order, optionally one media type only.
    pub async fn photo_urls(
        &self,
        listing_key: u64,
        media_type: Option<MediaType>,
    ) -> Result<Vec<String>, Error> {
        let mut clause = listing_clause(listing_key);
        if let Some(kind) = media_type {
            clause = format!("{clause} and {}", eq_clause("MediaType", kind.as_ref()));
        }
        let query = ODataQuery::new()
            .filter(clause)
            .select(["MediaURL"])
            .orderby("Order asc")
            .top(MAX_TOP);
        let page = self.list(&query).await?;

        Ok(page
            .value
            .into_iter()
            .filter_map(|mut item| match item.remove("MediaURL") {
                Some(Value::String(url)) => Some(url),
                _ => None,
            })
            .collect())
    }

    pub async fn by_category(
        &self,
        listing_key: u64,
        category: MediaCategory,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        let clause = format!(
            "{} and {}",
            listing_clause(listing_key),
            eq_clause("MediaCategory", category.as_ref())
        );
        self.filtered(&clause, query).await
    }

    pub async fn with_property(&self, query: ODataQuery) -> Result<ODataPage, Error> {
        self.list(&query.expand("Property")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_key_is_unquoted() {
        assert_eq!(listing_clause(1_611_952), "ResourceRecordKeyNumeric eq 1611952");
        assert_eq!(
            photo_clause(7),
            "ResourceRecordKeyNumeric eq 7 and MediaType eq 'Photo'"
        );
    }
}
