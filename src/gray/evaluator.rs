//! Gray evaluator: deterministic draft-or-published routing
//!
//! A client's bucket is derived from an unseeded SHA-256 over
//! (namespace, key, client id), so the same client always lands in the same
//! bucket across process restarts and across evaluator instances. Salting
//! with namespace and key keeps rollouts of different keys independent:
//! enabling 10% on two keys grays out two different 10% cohorts.
//!
//! This is a pure computation; all records are fetched by the caller.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::store::{ConfigFormat, ConfigItem, ConfigVersion, StoreError, StoreResult};

use super::rule::GrayRule;

/// Which lane a resolution was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServedVersion {
    Draft,
    Published,
}

/// The effective configuration for one client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolved {
    pub namespace: String,
    pub key: String,
    pub format: ConfigFormat,
    pub value: String,
    pub fingerprint: String,
    pub version: u64,
    pub served: ServedVersion,
}

impl Resolved {
    fn from_version(version: &ConfigVersion, served: ServedVersion) -> Self {
        Self {
            namespace: version.namespace().to_string(),
            key: version.key().to_string(),
            format: version.format(),
            value: version.value().to_string(),
            fingerprint: version.fingerprint().to_string(),
            version: version.version(),
            served,
        }
    }
}

/// Computes the deterministic bucket in [0, 99] for a client against one
/// key.
pub fn bucket(namespace: &str, key: &str, client_id: &str) -> u8 {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b"/");
    hasher.update(key.as_bytes());
    hasher.update(b"\n");
    hasher.update(client_id.as_bytes());
    let digest = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % 100) as u8
}

/// Decides which version of an item a client receives.
///
/// Decision order:
/// 1. No published version: serve the draft if one exists (bootstrap:
///    nothing has ever been released), otherwise NotFound.
/// 2. No rule, disabled rule, or no draft: serve the published version.
/// 3. Enabled rule with percentage P: serve the draft when the client's
///    bucket is below P, the published version otherwise.
///
/// Percentage 0 therefore serves published to every client and percentage
/// 100 serves the draft to every client. An absent or disabled rule is
/// normal control flow, never an error.
pub fn resolve(item: &ConfigItem, rule: Option<&GrayRule>, client_id: &str) -> StoreResult<Resolved> {
    let published = match item.published() {
        Some(published) => published,
        None => {
            return match item.draft() {
                Some(draft) => Ok(Resolved::from_version(draft, ServedVersion::Draft)),
                None => Err(StoreError::NotFound(format!(
                    "config not found: {}/{}",
                    item.namespace(),
                    item.key()
                ))),
            };
        }
    };

    let (rule, draft) = match (rule, item.draft()) {
        (Some(rule), Some(draft)) if rule.enabled => (rule, draft),
        _ => return Ok(Resolved::from_version(published, ServedVersion::Published)),
    };

    if bucket(item.namespace(), item.key(), client_id) < rule.percentage {
        Ok(Resolved::from_version(draft, ServedVersion::Draft))
    } else {
        Ok(Resolved::from_version(published, ServedVersion::Published))
    }
}
