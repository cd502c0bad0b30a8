//! Generic OData collection client.
//!
//! Each entity set is a zero-sized marker implementing [`Resource`];
//! [`ResourceClient<R>`] supplies list/get/modified-since/pagination once,
//! and the per-resource modules add their convenience filters in inherent
//! `impl ResourceClient<Marker>` blocks.

use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use crate::client::BaseClient;
use crate::error::Error;
use crate::query::{DateBound, MAX_TOP, ODataQuery, date_clause, quote};
use crate::types::{ODataPage, PaginatedRecords, PaginationInfo, Record};

/// An OData entity set exposed by the API.
pub trait Resource: Send + Sync + 'static {
    /// Entity set name as it appears in the URL (`Property`, `Member`, ...).
    const ENTITY_SET: &'static str;
    /// Timestamp used by [`ResourceClient::modified_since`].
    const MODIFIED_FIELD: &'static str = "ModificationTimestamp";
}

/// Client for one entity set.
pub struct ResourceClient<R> {
    base: BaseClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> fmt::Debug for ResourceClient<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("entity_set", &R::ENTITY_SET)
            .field("base_url", &self.base.base_url())
            .finish()
    }
}

impl<R: Resource> ResourceClient<R> {
    pub fn new(base: BaseClient) -> Self {
        Self {
            base,
            _resource: PhantomData,
        }
    }

    pub fn entity_set(&self) -> &'static str {
        R::ENTITY_SET
    }

    pub fn base(&self) -> &BaseClient {
        &self.base
    }

    // ── Core operations ──────────────────────────────────────────────

    /// `GET /{EntitySet}` with the given query options.
    pub async fn list(&self, query: &ODataQuery) -> Result<ODataPage, Error> {
        self.base.get_as(R::ENTITY_SET, &query.to_params()).await
    }

    /// `GET /{EntitySet}('{key}')`
    pub async fn get(&self, key: &str) -> Result<Record, Error> {
        let endpoint = format!("{}({})", R::ENTITY_SET, quote(key));
        self.base.get_as(&endpoint, &[]).await
    }

    /// Records whose modification timestamp is after `since`.
    pub async fn modified_since(
        &self,
        since: impl Into<DateBound>,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        let clause = date_clause(R::MODIFIED_FIELD, "gt", &since.into());
        self.filtered(&clause, query).await
    }

    /// Walk `$skip` pages of `page_size` until a short page or `max_pages`.
    pub async fn list_all(
        &self,
        query: ODataQuery,
        page_size: u32,
        max_pages: Option<u32>,
    ) -> Result<PaginatedRecords, Error> {
        let page_size = page_size.clamp(1, MAX_TOP);
        let full_page = usize::try_from(page_size).unwrap_or(usize::MAX);
        let mut skip = query.skip.unwrap_or(0);
        let mut last_skip = skip;
        let mut pages_fetched = 0_u32;
        let mut value = Vec::new();

        while max_pages.is_none_or(|max| pages_fetched < max) {
            let page = self.list(&query.clone().top(page_size).skip(skip)).await?;
            pages_fetched += 1;
            last_skip = skip;

            let fetched = page.value.len();
            debug!(entity = R::ENTITY_SET, skip, fetched, "fetched page");
            value.extend(page.value);

            if fetched < full_page {
                break;
            }
            skip = skip.saturating_add(page_size);
        }

        Ok(PaginatedRecords {
            pagination_info: PaginationInfo {
                pages_fetched,
                total_records: value.len(),
                page_size,
                last_skip,
            },
            value,
        })
    }

    // ── Helpers for convenience filters ─────────────────────────────

    /// `list` with `clause` AND-ed in front of the caller's filter.
    pub(crate) async fn filtered(
        &self,
        clause: &str,
        query: ODataQuery,
    ) -> Result<ODataPage, Error> {
        self.list(&query.and_filter_first(clause)).await
    }
}
