// One module per entity set; each adds convenience filters on top of
// the generic `ResourceClient`.

pub mod adu;
pub mod data_system;
pub mod deleted;
pub mod green_verification;
pub mod history;
pub mod lookup;
pub mod media;
pub mod member;
pub mod office;
pub mod openhouse;
pub mod property;
pub mod resource_info;
pub mod unit_types;

pub use adu::{Adu, AduClient, AduStatus, AduType};
pub use data_system::{DataSystem, DataSystemClient};
pub use deleted::{
    ActivityStatus, DEFAULT_SYNC_RESOURCES, Deleted, DeletedClient, DeletionActivity,
    DeletionCounts, DeletionSummary, DeletionSync, ResourceName, SyncInfo,
};
pub use green_verification::{GreenVerification, GreenVerificationClient, GreenVerificationType};
pub use history::{HistoryClient, HistoryStatus, HistoryTransactional, TransactionType};
pub use lookup::{Lookup, LookupClient};
pub use media::{Media, MediaCategory, MediaClient, MediaType};
pub use member::{Member, MemberClient, MemberStatus, MemberType};
pub use office::{Office, OfficeClient, OfficeStatus, OfficeType};
pub use openhouse::{AttendedBy, OpenHouse, OpenHouseClient, OpenHouseStatus, OpenHouseType};
pub use property::{Property, PropertyClient, PropertySearch, PropertyStatus, PropertyType};
pub use resource_info::{ResourceInfo, ResourceInfoClient};
pub use unit_types::{PropertyUnitTypes, PropertyUnitTypesClient};
