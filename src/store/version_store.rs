//! In-memory version store
//!
//! Shared mutable state behind two levels of locking:
//! - outer registries (`namespaces`, `items`) behind `RwLock`d ordered maps,
//!   taken only for lookups, inserts and removals;
//! - each `ConfigItem` behind its own `Arc<RwLock<_>>`, so writers to
//!   different keys never block each other and a writer to one key
//!   serializes against other writers and readers of that key only.
//!
//! Readers observe either the state before or after a mutation, never a
//! half-written draft/published pair: every mutation happens under the
//! item's write lock and every read clones under its read lock.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::errors::{StoreError, StoreResult};
use super::format::ConfigFormat;
use super::namespace::Namespace;
use super::version::{ConfigItem, ConfigItemSummary, ConfigVersion, ItemKey};

/// Maximum config key length
pub const MAX_KEY_LEN: usize = 128;

type ItemSlot = Arc<RwLock<ConfigItem>>;

/// The authoritative store of namespaces and config items
pub struct VersionStore {
    namespaces: RwLock<BTreeMap<String, Namespace>>,
    items: RwLock<BTreeMap<ItemKey, ItemSlot>>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(BTreeMap::new()),
            items: RwLock::new(BTreeMap::new()),
        }
    }

    /// Rebuilds a store from previously exported state.
    pub fn restore(namespaces: Vec<Namespace>, items: Vec<ConfigItem>) -> Self {
        let namespaces = namespaces.into_iter().map(|ns| (ns.id.clone(), ns)).collect();
        let items = items
            .into_iter()
            .map(|item| {
                (
                    ItemKey::new(item.namespace(), item.key()),
                    Arc::new(RwLock::new(item)),
                )
            })
            .collect();
        Self {
            namespaces: RwLock::new(namespaces),
            items: RwLock::new(items),
        }
    }

    /// Clones out the full state for snapshotting.
    pub fn export(&self) -> StoreResult<(Vec<Namespace>, Vec<ConfigItem>)> {
        let namespaces = self
            .namespaces
            .read()
            .map_err(|_| StoreError::poisoned("namespaces"))?
            .values()
            .cloned()
            .collect();
        let slots: Vec<ItemSlot> = self
            .items
            .read()
            .map_err(|_| StoreError::poisoned("items"))?
            .values()
            .cloned()
            .collect();
        let mut items = Vec::with_capacity(slots.len());
        for slot in slots {
            let item = slot.read().map_err(|_| StoreError::poisoned("item"))?;
            items.push(item.clone());
        }
        Ok((namespaces, items))
    }

    // ==================
    // Namespaces
    // ==================

    /// Creates a namespace. The id is validated before any mutation and a
    /// duplicate id is a Conflict.
    pub fn create_namespace(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> StoreResult<Namespace> {
        let ns = Namespace::new(id, name, description)?;
        let mut namespaces = self
            .namespaces
            .write()
            .map_err(|_| StoreError::poisoned("namespaces"))?;
        match namespaces.entry(ns.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "namespace already exists: {}",
                id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(ns.clone());
                Ok(ns)
            }
        }
    }

    pub fn get_namespace(&self, id: &str) -> StoreResult<Namespace> {
        self.namespaces
            .read()
            .map_err(|_| StoreError::poisoned("namespaces"))?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("namespace not found: {}", id)))
    }

    /// Lists all namespaces ordered by id ascending.
    pub fn list_namespaces(&self) -> StoreResult<Vec<Namespace>> {
        Ok(self
            .namespaces
            .read()
            .map_err(|_| StoreError::poisoned("namespaces"))?
            .values()
            .cloned()
            .collect())
    }

    /// Deletes a namespace and cascades to every config item it owns.
    ///
    /// Returns the keys of the removed items so the caller can cascade
    /// further (gray rules, change notifications).
    pub fn delete_namespace(&self, id: &str) -> StoreResult<Vec<ItemKey>> {
        let mut namespaces = self
            .namespaces
            .write()
            .map_err(|_| StoreError::poisoned("namespaces"))?;
        if namespaces.remove(id).is_none() {
            return Err(StoreError::NotFound(format!("namespace not found: {}", id)));
        }
        let mut items = self
            .items
            .write()
            .map_err(|_| StoreError::poisoned("items"))?;
        let owned: Vec<ItemKey> = items
            .keys()
            .filter(|k| k.namespace == id)
            .cloned()
            .collect();
        for key in &owned {
            items.remove(key);
        }
        Ok(owned)
    }

    fn require_namespace(&self, id: &str) -> StoreResult<()> {
        let namespaces = self
            .namespaces
            .read()
            .map_err(|_| StoreError::poisoned("namespaces"))?;
        if namespaces.contains_key(id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("namespace not found: {}", id)))
        }
    }

    // ==================
    // Config items
    // ==================

    /// Saves a draft version for (namespace, key).
    ///
    /// The namespace must already exist; drafts never auto-create
    /// namespaces. Semantics of idempotence, version numbering and format
    /// pinning live on [`ConfigItem::save_draft`].
    pub fn save_draft(
        &self,
        namespace: &str,
        key: &str,
        format: ConfigFormat,
        value: &str,
    ) -> StoreResult<ConfigVersion> {
        validate_key(key)?;
        self.require_namespace(namespace)?;
        let ikey = ItemKey::new(namespace, key);

        // Fast path: the item exists, mutate under its own lock.
        let existing = self
            .items
            .read()
            .map_err(|_| StoreError::poisoned("items"))?
            .get(&ikey)
            .cloned();
        if let Some(slot) = existing {
            let mut item = slot.write().map_err(|_| StoreError::poisoned("item"))?;
            return item.save_draft(format, value.to_string());
        }

        // Slow path: first version ever for this key. Another writer may
        // have created it between the read above and this write lock. The
        // namespace is re-checked under a read lock held across the insert
        // (same namespaces-then-items order as delete_namespace), so a
        // concurrent namespace delete cannot leave an orphaned item.
        let namespaces = self
            .namespaces
            .read()
            .map_err(|_| StoreError::poisoned("namespaces"))?;
        if !namespaces.contains_key(namespace) {
            return Err(StoreError::NotFound(format!(
                "namespace not found: {}",
                namespace
            )));
        }
        let mut items = self
            .items
            .write()
            .map_err(|_| StoreError::poisoned("items"))?;
        match items.entry(ikey) {
            Entry::Occupied(slot) => {
                let slot = slot.get().clone();
                drop(items);
                let mut item = slot.write().map_err(|_| StoreError::poisoned("item"))?;
                item.save_draft(format, value.to_string())
            }
            Entry::Vacant(slot) => {
                let item = ConfigItem::with_first_draft(namespace, key, format, value.to_string());
                let draft = item.draft().cloned().expect("fresh item has a draft");
                slot.insert(Arc::new(RwLock::new(item)));
                Ok(draft)
            }
        }
    }

    pub fn get_draft(&self, namespace: &str, key: &str) -> StoreResult<ConfigVersion> {
        let item = self.get_item(namespace, key)?;
        item.draft()
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("draft not found: {}/{}", namespace, key)))
    }

    pub fn get_published(&self, namespace: &str, key: &str) -> StoreResult<ConfigVersion> {
        let item = self.get_item(namespace, key)?;
        item.published().cloned().ok_or_else(|| {
            StoreError::NotFound(format!("published config not found: {}/{}", namespace, key))
        })
    }

    /// Returns a consistent clone of the whole item (both slots read under
    /// one lock acquisition, so draft and published cannot be torn apart).
    pub fn get_item(&self, namespace: &str, key: &str) -> StoreResult<ConfigItem> {
        let slot = self
            .items
            .read()
            .map_err(|_| StoreError::poisoned("items"))?
            .get(&ItemKey::new(namespace, key))
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound(format!("config not found: {}/{}", namespace, key))
            })?;
        let item = slot.read().map_err(|_| StoreError::poisoned("item"))?;
        Ok(item.clone())
    }

    /// Lists config item summaries for a namespace, ordered by key
    /// ascending.
    pub fn list_items(&self, namespace: &str) -> StoreResult<Vec<ConfigItemSummary>> {
        self.require_namespace(namespace)?;
        let slots: Vec<ItemSlot> = {
            let items = self
                .items
                .read()
                .map_err(|_| StoreError::poisoned("items"))?;
            items
                .range(ItemKey::new(namespace, String::new())..)
                .take_while(|(k, _)| k.namespace == namespace)
                .map(|(_, slot)| slot.clone())
                .collect()
        };
        let mut summaries = Vec::with_capacity(slots.len());
        for slot in slots {
            let item = slot.read().map_err(|_| StoreError::poisoned("item"))?;
            summaries.push(item.summary());
        }
        Ok(summaries)
    }

    /// Promotes the draft of (namespace, key) into a new published version.
    ///
    /// A missing item means there is no draft either, so both cases fail
    /// with the same FailedPrecondition.
    pub fn publish(&self, namespace: &str, key: &str) -> StoreResult<ConfigVersion> {
        let slot = self
            .items
            .read()
            .map_err(|_| StoreError::poisoned("items"))?
            .get(&ItemKey::new(namespace, key))
            .cloned()
            .ok_or_else(|| {
                StoreError::FailedPrecondition(format!(
                    "nothing to publish for {}/{}",
                    namespace, key
                ))
            })?;
        let mut item = slot.write().map_err(|_| StoreError::poisoned("item"))?;
        item.publish()
    }

    /// Removes the entire item (draft and published).
    pub fn delete_item(&self, namespace: &str, key: &str) -> StoreResult<()> {
        let mut items = self
            .items
            .write()
            .map_err(|_| StoreError::poisoned("items"))?;
        items
            .remove(&ItemKey::new(namespace, key))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("config not found: {}/{}", namespace, key)))
    }
}

impl Default for VersionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_key(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidArgument("key must not be empty".into()));
    }
    if key.len() > MAX_KEY_LEN {
        return Err(StoreError::InvalidArgument(format!(
            "key exceeds {} characters",
            MAX_KEY_LEN
        )));
    }
    Ok(())
}
