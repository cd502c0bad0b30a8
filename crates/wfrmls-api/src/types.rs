// OData response envelopes.
//
// Records are kept as raw JSON objects; the library only interprets the
// envelope around them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entity as returned by the API, untouched.
pub type Record = Map<String, Value>;

/// A page of results from a collection request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ODataPage {
    #[serde(
        rename = "@odata.context",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub context: Option<String>,

    #[serde(
        rename = "@odata.count",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub count: Option<u64>,

    #[serde(
        rename = "@odata.nextLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_link: Option<String>,

    #[serde(default)]
    pub value: Vec<Record>,

    /// Any other top-level keys (e.g. a `message` from a non-JSON body).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ODataPage {
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Progress counters for [`PaginatedRecords`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub pages_fetched: u32,
    pub total_records: usize,
    pub page_size: u32,
    pub last_skip: u32,
}

/// Records accumulated across several `$skip` pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedRecords {
    pub value: Vec<Record>,
    pub pagination_info: PaginationInfo,
}
