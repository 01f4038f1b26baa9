//! Gray rule: percentage-based rollout policy for one config key

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{StoreError, StoreResult};

/// A rollout rule for one (namespace, key).
///
/// `percentage` is the fraction of clients (in whole percent) routed to the
/// draft value while the rule is enabled. A rule for a key with no draft is
/// permitted; it simply has no observable effect until a draft exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrayRule {
    pub namespace: String,
    pub key: String,
    pub percentage: u8,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GrayRule {
    pub fn new(
        namespace: impl Into<String>,
        key: impl Into<String>,
        percentage: u8,
        enabled: bool,
    ) -> StoreResult<Self> {
        validate_percentage(percentage)?;
        let now = Utc::now();
        Ok(Self {
            namespace: namespace.into(),
            key: key.into(),
            percentage,
            enabled,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Validates that a rollout percentage is within [0, 100].
pub fn validate_percentage(percentage: u8) -> StoreResult<()> {
    if percentage > 100 {
        return Err(StoreError::InvalidArgument(format!(
            "percentage must be within [0, 100]: {}",
            percentage
        )));
    }
    Ok(())
}
