//! Version store: namespaces, config items and their draft/published
//! versions.

pub mod checksum;
pub mod errors;
pub mod format;
pub mod namespace;
pub mod version;
pub mod version_store;

pub use checksum::{fingerprint, verify_fingerprint};
pub use errors::{StoreError, StoreResult};
pub use format::ConfigFormat;
pub use namespace::{validate_namespace_id, Namespace};
pub use version::{ConfigItem, ConfigItemSummary, ConfigVersion, ItemKey, ItemState};
pub use version_store::VersionStore;
