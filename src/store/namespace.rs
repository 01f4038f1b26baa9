//! Namespaces: top-level grouping for configuration keys
//!
//! A namespace is created explicitly, never auto-created by a draft save.
//! Its id is its immutable identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};

/// Maximum namespace id length
pub const MAX_NAMESPACE_ID_LEN: usize = 64;

/// A configuration namespace (typically one application or service)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Namespace {
    /// Creates a namespace after validating its id.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> StoreResult<Self> {
        let id = id.into();
        validate_namespace_id(&id)?;
        let now = Utc::now();
        Ok(Self {
            id,
            name: name.into(),
            description: description.into(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Validates a namespace id: non-empty, at most 64 characters, lowercase
/// alphanumeric plus hyphen.
pub fn validate_namespace_id(id: &str) -> StoreResult<()> {
    if id.is_empty() {
        return Err(StoreError::InvalidArgument(
            "namespace id must not be empty".into(),
        ));
    }
    if id.len() > MAX_NAMESPACE_ID_LEN {
        return Err(StoreError::InvalidArgument(format!(
            "namespace id exceeds {} characters",
            MAX_NAMESPACE_ID_LEN
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(StoreError::InvalidArgument(format!(
            "namespace id must be lowercase alphanumeric or hyphen: {}",
            id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        for id in ["demo", "my-app", "svc-2", "a", "0-0"] {
            assert!(validate_namespace_id(id).is_ok(), "{} should be valid", id);
        }
    }

    #[test]
    fn test_invalid_ids() {
        for id in ["", "Demo", "my_app", "a b", "app!", &"x".repeat(65)] {
            let err = validate_namespace_id(id).unwrap_err();
            assert_eq!(err.code(), "INVALID_ARGUMENT", "{} should be invalid", id);
        }
    }

    #[test]
    fn test_new_rejects_bad_id() {
        assert!(Namespace::new("Bad_Id", "Bad", "").is_err());
        let ns = Namespace::new("demo", "Demo App", "demo namespace").unwrap();
        assert_eq!(ns.id, "demo");
        assert_eq!(ns.created_at, ns.updated_at);
    }
}
