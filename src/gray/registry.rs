//! Gray rule registry: at most one rule per (namespace, key)

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Utc;

use crate::store::{ItemKey, StoreError, StoreResult};

use super::rule::{validate_percentage, GrayRule};

/// Registry of rollout rules, keyed by (namespace, key)
pub struct GrayRuleRegistry {
    rules: RwLock<BTreeMap<ItemKey, GrayRule>>,
}

impl GrayRuleRegistry {
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(BTreeMap::new()),
        }
    }

    /// Rebuilds a registry from previously exported rules.
    pub fn restore(rules: Vec<GrayRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| (ItemKey::new(&rule.namespace, &rule.key), rule))
            .collect();
        Self {
            rules: RwLock::new(rules),
        }
    }

    /// Clones out all rules for snapshotting.
    pub fn export(&self) -> StoreResult<Vec<GrayRule>> {
        Ok(self
            .rules
            .read()
            .map_err(|_| StoreError::poisoned("gray rules"))?
            .values()
            .cloned()
            .collect())
    }

    /// Upserts the rule for (namespace, key): creates it when absent,
    /// overwrites percentage and enabled when present. The percentage is
    /// validated before any mutation; created_at survives an overwrite.
    pub fn save(
        &self,
        namespace: &str,
        key: &str,
        percentage: u8,
        enabled: bool,
    ) -> StoreResult<GrayRule> {
        validate_percentage(percentage)?;
        let mut rules = self
            .rules
            .write()
            .map_err(|_| StoreError::poisoned("gray rules"))?;
        let ikey = ItemKey::new(namespace, key);
        let rule = match rules.get(&ikey) {
            Some(existing) => {
                let mut updated = existing.clone();
                updated.percentage = percentage;
                updated.enabled = enabled;
                updated.updated_at = Utc::now();
                updated
            }
            None => GrayRule::new(namespace, key, percentage, enabled)?,
        };
        rules.insert(ikey, rule.clone());
        Ok(rule)
    }

    pub fn get(&self, namespace: &str, key: &str) -> StoreResult<GrayRule> {
        self.rules
            .read()
            .map_err(|_| StoreError::poisoned("gray rules"))?
            .get(&ItemKey::new(namespace, key))
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound(format!("gray rule not found: {}/{}", namespace, key))
            })
    }

    /// Returns the rule if one exists; absence is normal control flow for
    /// resolution, not an error.
    pub fn find(&self, namespace: &str, key: &str) -> StoreResult<Option<GrayRule>> {
        Ok(self
            .rules
            .read()
            .map_err(|_| StoreError::poisoned("gray rules"))?
            .get(&ItemKey::new(namespace, key))
            .cloned())
    }

    /// Lists the rules of a namespace, ordered by key ascending.
    pub fn list(&self, namespace: &str) -> StoreResult<Vec<GrayRule>> {
        Ok(self
            .rules
            .read()
            .map_err(|_| StoreError::poisoned("gray rules"))?
            .range(ItemKey::new(namespace, String::new())..)
            .take_while(|(k, _)| k.namespace == namespace)
            .map(|(_, rule)| rule.clone())
            .collect())
    }

    pub fn delete(&self, namespace: &str, key: &str) -> StoreResult<()> {
        self.rules
            .write()
            .map_err(|_| StoreError::poisoned("gray rules"))?
            .remove(&ItemKey::new(namespace, key))
            .map(|_| ())
            .ok_or_else(|| {
                StoreError::NotFound(format!("gray rule not found: {}/{}", namespace, key))
            })
    }

    /// Removes rules for the given keys if present (cascade from item or
    /// namespace deletion; missing rules are not an error here).
    pub fn delete_all(&self, keys: &[ItemKey]) -> StoreResult<()> {
        let mut rules = self
            .rules
            .write()
            .map_err(|_| StoreError::poisoned("gray rules"))?;
        for key in keys {
            rules.remove(key);
        }
        Ok(())
    }
}

impl Default for GrayRuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_preserves_created_at() {
        let registry = GrayRuleRegistry::new();
        let first = registry.save("demo", "app.yaml", 10, true).unwrap();
        let second = registry.save("demo", "app.yaml", 50, false).unwrap();
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.percentage, 50);
        assert!(!second.enabled);
        // Still exactly one rule for the key.
        assert_eq!(registry.list("demo").unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_percentage_rejected_before_mutation() {
        let registry = GrayRuleRegistry::new();
        registry.save("demo", "app.yaml", 10, true).unwrap();
        let err = registry.save("demo", "app.yaml", 200, true).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert_eq!(registry.get("demo", "app.yaml").unwrap().percentage, 10);
    }

    #[test]
    fn test_get_and_delete() {
        let registry = GrayRuleRegistry::new();
        assert_eq!(
            registry.get("demo", "app.yaml").unwrap_err().code(),
            "NOT_FOUND"
        );
        registry.save("demo", "app.yaml", 10, true).unwrap();
        registry.delete("demo", "app.yaml").unwrap();
        assert_eq!(
            registry.delete("demo", "app.yaml").unwrap_err().code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn test_list_scoped_to_namespace() {
        let registry = GrayRuleRegistry::new();
        registry.save("demo", "b.yaml", 10, true).unwrap();
        registry.save("demo", "a.yaml", 20, true).unwrap();
        registry.save("other", "c.yaml", 30, true).unwrap();

        let keys: Vec<String> = registry
            .list("demo")
            .unwrap()
            .into_iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec!["a.yaml", "b.yaml"]);
    }

    #[test]
    fn test_delete_all_ignores_missing() {
        let registry = GrayRuleRegistry::new();
        registry.save("demo", "a.yaml", 10, true).unwrap();
        registry
            .delete_all(&[
                ItemKey::new("demo", "a.yaml"),
                ItemKey::new("demo", "missing.yaml"),
            ])
            .unwrap();
        assert!(registry.list("demo").unwrap().is_empty());
    }
}
