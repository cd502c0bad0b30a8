//! Single entry point exposing every resource client.
//!
//! The token is resolved once at construction (no network call); each
//! resource client is created on first access and memoised in a
//! `OnceLock`, so repeated accesses return the same instance and the
//! facade can be shared across tasks.

use std::fmt;
use std::sync::OnceLock;

use secrecy::SecretString;

use crate::client::BaseClient;
use crate::error::Error;
use crate::resource::ResourceClient;
use crate::resources::{
    AduClient, DataSystemClient, DeletedClient, GreenVerificationClient, HistoryClient,
    LookupClient, MediaClient, MemberClient, OfficeClient, OpenHouseClient, PropertyClient,
    PropertyUnitTypesClient, ResourceInfoClient,
};
use crate::transport::TransportConfig;

pub struct WfrmlsClient {
    base: BaseClient,
    property: OnceLock<PropertyClient>,
    member: OnceLock<MemberClient>,
    office: OnceLock<OfficeClient>,
    openhouse: OnceLock<OpenHouseClient>,
    media: OnceLock<MediaClient>,
    history: OnceLock<HistoryClient>,
    green_verification: OnceLock<GreenVerificationClient>,
    data_system: OnceLock<DataSystemClient>,
    resource: OnceLock<ResourceInfoClient>,
    property_unit_types: OnceLock<PropertyUnitTypesClient>,
    lookup: OnceLock<LookupClient>,
    adu: OnceLock<AduClient>,
    deleted: OnceLock<DeletedClient>,
}

impl WfrmlsClient {
    /// Resolve the token (argument or `WFRMLS_BEARER_TOKEN`) and build the
    /// shared session. Does not contact the API.
    pub fn new(token: Option<SecretString>, base_url: Option<&str>) -> Result<Self, Error> {
        Ok(Self::from_base(BaseClient::new(token, base_url)?))
    }

    pub fn with_transport(
        token: Option<SecretString>,
        base_url: Option<&str>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Ok(Self::from_base(BaseClient::with_transport(
            token, base_url, transport,
        )?))
    }

    pub fn from_base(base: BaseClient) -> Self {
        Self {
            base,
            property: OnceLock::new(),
            member: OnceLock::new(),
            office: OnceLock::new(),
            openhouse: OnceLock::new(),
            media: OnceLock::new(),
            history: OnceLock::new(),
            green_verification: OnceLock::new(),
            data_system: OnceLock::new(),
            resource: OnceLock::new(),
            property_unit_types: OnceLock::new(),
            lookup: OnceLock::new(),
            adu: OnceLock::new(),
            deleted: OnceLock::new(),
        }
    }

    pub fn base(&self) -> &BaseClient {
        &self.base
    }

    fn init<'a, R: crate::Resource>(&self, cell: &'a OnceLock<ResourceClient<R>>) -> &'a ResourceClient<R> {
        cell.get_or_init(|| ResourceClient::new(self.base.clone()))
    }

    // ── Resource accessors ───────────────────────────────────────────

    pub fn property(&self) -> &PropertyClient {
        self.init(&self.property)
    }

    pub fn member(&self) -> &MemberClient {
        self.init(&self.member)
    }

    pub fn office(&self) -> &OfficeClient {
        self.init(&self.office)
    }

    pub fn openhouse(&self) -> &OpenHouseClient {
        self.init(&self.openhouse)
    }

    pub fn media(&self) -> &MediaClient {
        self.init(&self.media)
    }

    pub fn history(&self) -> &HistoryClient {
        self.init(&self.history)
    }

    pub fn green_verification(&self) -> &GreenVerificationClient {
        self.init(&self.green_verification)
    }

    pub fn data_system(&self) -> &DataSystemClient {
        self.init(&self.data_system)
    }

    /// The `Resource` metadata entity set.
    pub fn resource(&self) -> &ResourceInfoClient {
        self.init(&self.resource)
    }

    pub fn property_unit_types(&self) -> &PropertyUnitTypesClient {
        self.init(&self.property_unit_types)
    }

    pub fn lookup(&self) -> &LookupClient {
        self.init(&self.lookup)
    }

    pub fn adu(&self) -> &AduClient {
        self.init(&self.adu)
    }

    pub fn deleted(&self) -> &DeletedClient {
        self.init(&self.deleted)
    }

    // ── Service document ─────────────────────────────────────────────

    /// The CSDL `$metadata` document as XML.
    pub async fn metadata(&self) -> Result<String, Error> {
        self.base.get_metadata().await
    }
}

impl fmt::Debug for WfrmlsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WfrmlsClient")
            .field("base_url", &self.base.base_url())
            .finish_non_exhaustive()
    }
}
