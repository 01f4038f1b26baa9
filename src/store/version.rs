//! Config versions and the dual-slot config item
//!
//! A `ConfigVersion` is logically immutable: a new value produces a new
//! version, never an in-place mutation of fingerprint or version number.
//! A `ConfigItem` is the logical unit addressed by (namespace, key) and
//! holds at most one draft and at most one published version. An item with
//! neither slot populated does not exist; the store deletes it instead.
//!
//! Draft and published version numbers are independent monotonic counters:
//! publishing mints a new published version without touching the draft's
//! counter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::checksum::fingerprint;
use super::errors::{StoreError, StoreResult};
use super::format::ConfigFormat;

/// Addressing key for a config item or gray rule
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub namespace: String,
    pub key: String,
}

impl ItemKey {
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.key)
    }
}

/// A single immutable configuration version.
///
/// All fields are private to enforce immutability after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigVersion {
    namespace: String,
    key: String,
    format: ConfigFormat,
    value: String,
    fingerprint: String,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConfigVersion {
    fn new(
        namespace: &str,
        key: &str,
        format: ConfigFormat,
        value: String,
        digest: String,
        version: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            namespace: namespace.to_string(),
            key: key.to_string(),
            format,
            value,
            fingerprint: digest,
            version,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn format(&self) -> ConfigFormat {
        self.format
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[inline]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Returns the monotonic version number within this version's lane
    /// (draft or published), starting at 1.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// The four lifecycle states of a config item, made switch-checkable.
///
/// `Empty` is never observable through the store: an item that would become
/// empty is deleted instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    DraftOnly,
    PublishedOnly,
    DraftAndPublished,
}

/// The dual-slot record for one (namespace, key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigItem {
    namespace: String,
    key: String,
    format: ConfigFormat,
    draft: Option<ConfigVersion>,
    published: Option<ConfigVersion>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConfigItem {
    /// Creates a new item with its first draft version. The format is fixed
    /// for the lifetime of the key from this point on.
    pub fn with_first_draft(
        namespace: &str,
        key: &str,
        format: ConfigFormat,
        value: String,
    ) -> Self {
        let digest = fingerprint(&value);
        let draft = ConfigVersion::new(namespace, key, format, value, digest, 1);
        let now = Utc::now();
        Self {
            namespace: namespace.to_string(),
            key: key.to_string(),
            format,
            draft: Some(draft),
            published: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the format established when the key was first created
    #[inline]
    pub fn format(&self) -> ConfigFormat {
        self.format
    }

    #[inline]
    pub fn draft(&self) -> Option<&ConfigVersion> {
        self.draft.as_ref()
    }

    #[inline]
    pub fn published(&self) -> Option<&ConfigVersion> {
        self.published.as_ref()
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the lifecycle state of this item.
    pub fn state(&self) -> ItemState {
        match (&self.draft, &self.published) {
            (Some(_), None) => ItemState::DraftOnly,
            (None, Some(_)) => ItemState::PublishedOnly,
            (Some(_), Some(_)) => ItemState::DraftAndPublished,
            // Ruled out by the store: empty items are deleted, and every
            // constructor populates a slot.
            (None, None) => unreachable!("config item with neither draft nor published"),
        }
    }

    /// Records a new draft value.
    ///
    /// Idempotent: if the current draft has an identical fingerprint, the
    /// existing version is returned unchanged and no new version number is
    /// minted. A format that conflicts with the established format for this
    /// key is rejected before any mutation.
    pub fn save_draft(
        &mut self,
        format: ConfigFormat,
        value: String,
    ) -> StoreResult<ConfigVersion> {
        if format != self.format {
            return Err(StoreError::InvalidArgument(format!(
                "format {} conflicts with established format {} for {}/{}",
                format, self.format, self.namespace, self.key
            )));
        }

        let digest = fingerprint(&value);
        if let Some(draft) = &self.draft {
            if draft.fingerprint() == digest {
                return Ok(draft.clone());
            }
        }

        let next = self.draft.as_ref().map(|d| d.version()).unwrap_or(0) + 1;
        let version =
            ConfigVersion::new(&self.namespace, &self.key, self.format, value, digest, next);
        self.draft = Some(version.clone());
        self.updated_at = version.created_at();
        Ok(version)
    }

    /// Promotes the draft into a new published version.
    ///
    /// Fails with FailedPrecondition when no draft exists. When the draft's
    /// fingerprint already equals the published fingerprint this is a no-op
    /// that returns the existing published version unchanged. The draft slot
    /// is never cleared: operators keep iterating toward the next release.
    pub fn publish(&mut self) -> StoreResult<ConfigVersion> {
        let draft = self.draft.as_ref().ok_or_else(|| {
            StoreError::FailedPrecondition(format!(
                "nothing to publish for {}/{}",
                self.namespace, self.key
            ))
        })?;

        if let Some(published) = &self.published {
            if published.fingerprint() == draft.fingerprint() {
                return Ok(published.clone());
            }
        }

        let next = self.published.as_ref().map(|p| p.version()).unwrap_or(0) + 1;
        let version = ConfigVersion::new(
            &self.namespace,
            &self.key,
            self.format,
            draft.value().to_string(),
            draft.fingerprint().to_string(),
            next,
        );
        self.published = Some(version.clone());
        self.updated_at = version.created_at();
        Ok(version)
    }

    /// Builds the listing summary for this item.
    pub fn summary(&self) -> ConfigItemSummary {
        ConfigItemSummary {
            namespace: self.namespace.clone(),
            key: self.key.clone(),
            format: self.format,
            draft_version: self.draft.as_ref().map(|d| d.version()),
            draft_fingerprint: self.draft.as_ref().map(|d| d.fingerprint().to_string()),
            published_version: self.published.as_ref().map(|p| p.version()),
            published_fingerprint: self.published.as_ref().map(|p| p.fingerprint().to_string()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Listing row for a config item: presence, fingerprints and timestamps
/// without the value bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigItemSummary {
    pub namespace: String,
    pub key: String,
    pub format: ConfigFormat,
    pub draft_version: Option<u64>,
    pub draft_fingerprint: Option<String>,
    pub published_version: Option<u64>,
    pub published_fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConfigItemSummary {
    #[inline]
    pub fn has_draft(&self) -> bool {
        self.draft_version.is_some()
    }

    #[inline]
    pub fn has_published(&self) -> bool {
        self.published_version.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> ConfigItem {
        ConfigItem::with_first_draft("demo", "app.yaml", ConfigFormat::Yaml, "a: 1".into())
    }

    #[test]
    fn test_first_draft_is_version_one() {
        let item = item();
        let draft = item.draft().unwrap();
        assert_eq!(draft.version(), 1);
        assert_eq!(draft.fingerprint(), fingerprint("a: 1"));
        assert_eq!(item.state(), ItemState::DraftOnly);
    }

    #[test]
    fn test_save_draft_idempotent_on_same_content() {
        let mut item = item();
        let again = item.save_draft(ConfigFormat::Yaml, "a: 1".into()).unwrap();
        assert_eq!(again.version(), 1);
        assert_eq!(item.draft().unwrap().version(), 1);
    }

    #[test]
    fn test_save_draft_increments_on_new_content() {
        let mut item = item();
        let v2 = item.save_draft(ConfigFormat::Yaml, "a: 2".into()).unwrap();
        assert_eq!(v2.version(), 2);
        let v3 = item.save_draft(ConfigFormat::Yaml, "a: 3".into()).unwrap();
        assert_eq!(v3.version(), 3);
    }

    #[test]
    fn test_format_conflict_rejected() {
        let mut item = item();
        let err = item
            .save_draft(ConfigFormat::Json, "{\"a\": 1}".into())
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        // No mutation happened.
        assert_eq!(item.draft().unwrap().version(), 1);
    }

    #[test]
    fn test_publish_copies_draft_into_independent_version() {
        let mut item = item();
        let published = item.publish().unwrap();
        assert_eq!(published.version(), 1);
        assert_eq!(published.value(), "a: 1");
        assert_eq!(
            published.fingerprint(),
            item.draft().unwrap().fingerprint()
        );
        assert_eq!(item.state(), ItemState::DraftAndPublished);

        // Draft counter keeps its own lane.
        item.save_draft(ConfigFormat::Yaml, "a: 2".into()).unwrap();
        item.save_draft(ConfigFormat::Yaml, "a: 3".into()).unwrap();
        let published = item.publish().unwrap();
        assert_eq!(published.version(), 2);
        assert_eq!(item.draft().unwrap().version(), 3);
    }

    #[test]
    fn test_publish_noop_when_fingerprints_match() {
        let mut item = item();
        let first = item.publish().unwrap();
        let second = item.publish().unwrap();
        assert_eq!(first, second);
        assert_eq!(second.version(), 1);
    }

    #[test]
    fn test_stale_draft_detectable_via_fingerprint() {
        let mut item = item();
        item.publish().unwrap();
        // Draft equal to published means there is nothing new to release.
        assert_eq!(
            item.draft().unwrap().fingerprint(),
            item.published().unwrap().fingerprint()
        );
        item.save_draft(ConfigFormat::Yaml, "a: 2".into()).unwrap();
        assert_ne!(
            item.draft().unwrap().fingerprint(),
            item.published().unwrap().fingerprint()
        );
    }

    #[test]
    fn test_summary_reflects_slots() {
        let mut item = item();
        let summary = item.summary();
        assert!(summary.has_draft());
        assert!(!summary.has_published());

        item.publish().unwrap();
        let summary = item.summary();
        assert!(summary.has_published());
        assert_eq!(summary.published_version, Some(1));
        assert_eq!(summary.draft_fingerprint, summary.published_fingerprint);
    }
}
