// wfrmls-api: Async Rust client for the WFRMLS RESO OData API

pub mod client;
pub mod error;
pub mod facade;
pub mod query;
pub mod resource;
pub mod resources;
pub mod transport;
pub mod types;

pub use client::{BaseClient, DEFAULT_BASE_URL, TOKEN_ENV_VAR, interpret_response};
pub use error::Error;
pub use facade::WfrmlsClient;
pub use query::{DateBound, FieldList, MAX_TOP, ODataQuery};
pub use resource::{Resource, ResourceClient};
pub use transport::{TlsMode, TransportConfig};
pub use types::{ODataPage, PaginatedRecords, PaginationInfo, Record};
