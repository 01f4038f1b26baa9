//! Query façade: the one surface consoles and config-consuming clients call
//!
//! `ConfigService` wires the version store, gray rule registry, publish
//! pipeline and change notifier together and exposes one method per
//! external operation. Mutations give the caller read-after-write
//! consistency; `resolve` is the hot path and touches only read locks.
//!
//! When a snapshot path is configured, every successful admin mutation
//! persists the full state. Config stores are low-write-rate, so a
//! synchronous snapshot per mutation is cheaper than recovering a lost one.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::gray::{self, GrayRule, GrayRuleRegistry, Resolved};
use crate::notify::{ChangeKind, ChangeNotifier};
use crate::observability::Logger;
use crate::publish::PublishPipeline;
use crate::snapshot::{self, StoreState};
use crate::store::{
    ConfigFormat, ConfigItemSummary, ConfigVersion, ItemKey, Namespace, StoreResult, VersionStore,
};

/// The configuration service façade
pub struct ConfigService {
    store: Arc<VersionStore>,
    rules: Arc<GrayRuleRegistry>,
    notifier: Arc<ChangeNotifier>,
    pipeline: PublishPipeline,
    snapshot_path: Option<PathBuf>,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::from_state(StoreState::default())
    }

    /// Builds a service from previously snapshotted state.
    pub fn from_state(state: StoreState) -> Self {
        let store = Arc::new(VersionStore::restore(state.namespaces, state.items));
        let rules = Arc::new(GrayRuleRegistry::restore(state.rules));
        let notifier = Arc::new(ChangeNotifier::new());
        let pipeline = PublishPipeline::new(store.clone(), notifier.clone());
        Self {
            store,
            rules,
            notifier,
            pipeline,
            snapshot_path: None,
        }
    }

    /// Enables snapshot persistence after each successful mutation.
    pub fn with_snapshot_path(mut self, path: PathBuf) -> Self {
        self.snapshot_path = Some(path);
        self
    }

    // ==================
    // Namespaces
    // ==================

    pub fn create_namespace(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> StoreResult<Namespace> {
        let ns = self.store.create_namespace(id, name, description)?;
        Logger::info("NAMESPACE_CREATED", &[("namespace", id)]);
        self.persist();
        Ok(ns)
    }

    pub fn get_namespace(&self, id: &str) -> StoreResult<Namespace> {
        self.store.get_namespace(id)
    }

    pub fn list_namespaces(&self) -> StoreResult<Vec<Namespace>> {
        self.store.list_namespaces()
    }

    /// Deletes a namespace, cascading to its config items and gray rules.
    pub fn delete_namespace(&self, id: &str) -> StoreResult<()> {
        let removed = self.store.delete_namespace(id)?;
        self.rules.delete_all(&removed)?;
        for key in &removed {
            self.notifier
                .notify(&key.namespace, &key.key, ChangeKind::Deleted)?;
        }
        Logger::info(
            "NAMESPACE_DELETED",
            &[
                ("namespace", id),
                ("cascaded_items", &removed.len().to_string()),
            ],
        );
        self.persist();
        Ok(())
    }

    // ==================
    // Config items
    // ==================

    pub fn save_draft(
        &self,
        namespace: &str,
        key: &str,
        format: ConfigFormat,
        value: &str,
    ) -> StoreResult<ConfigVersion> {
        let version = self.store.save_draft(namespace, key, format, value)?;
        Logger::info(
            "DRAFT_SAVED",
            &[
                ("namespace", namespace),
                ("key", key),
                ("version", &version.version().to_string()),
            ],
        );
        self.persist();
        Ok(version)
    }

    pub fn get_draft(&self, namespace: &str, key: &str) -> StoreResult<ConfigVersion> {
        self.store.get_draft(namespace, key)
    }

    pub fn get_published(&self, namespace: &str, key: &str) -> StoreResult<ConfigVersion> {
        self.store.get_published(namespace, key)
    }

    pub fn list_config_items(&self, namespace: &str) -> StoreResult<Vec<ConfigItemSummary>> {
        self.store.list_items(namespace)
    }

    pub fn publish(&self, namespace: &str, key: &str) -> StoreResult<ConfigVersion> {
        let version = self.pipeline.publish(namespace, key)?;
        self.persist();
        Ok(version)
    }

    /// Deletes the entire config item and, with it, its gray rule.
    pub fn delete_config_item(&self, namespace: &str, key: &str) -> StoreResult<()> {
        self.store.delete_item(namespace, key)?;
        self.rules.delete_all(&[ItemKey::new(namespace, key)])?;
        self.notifier.notify(namespace, key, ChangeKind::Deleted)?;
        Logger::info("CONFIG_DELETED", &[("namespace", namespace), ("key", key)]);
        self.persist();
        Ok(())
    }

    // ==================
    // Gray rules
    // ==================

    pub fn save_gray_rule(
        &self,
        namespace: &str,
        key: &str,
        percentage: u8,
        enabled: bool,
    ) -> StoreResult<GrayRule> {
        self.store.get_namespace(namespace)?;
        let rule = self.rules.save(namespace, key, percentage, enabled)?;
        // Routing outcomes may have changed; wake pollers so they re-resolve.
        self.notifier.notify(namespace, key, ChangeKind::Updated)?;
        Logger::info(
            "GRAY_RULE_SAVED",
            &[
                ("namespace", namespace),
                ("key", key),
                ("percentage", &percentage.to_string()),
                ("enabled", if enabled { "true" } else { "false" }),
            ],
        );
        self.persist();
        Ok(rule)
    }

    pub fn get_gray_rule(&self, namespace: &str, key: &str) -> StoreResult<GrayRule> {
        self.rules.get(namespace, key)
    }

    pub fn list_gray_rules(&self, namespace: &str) -> StoreResult<Vec<GrayRule>> {
        self.store.get_namespace(namespace)?;
        self.rules.list(namespace)
    }

    pub fn delete_gray_rule(&self, namespace: &str, key: &str) -> StoreResult<()> {
        self.rules.delete(namespace, key)?;
        self.notifier.notify(namespace, key, ChangeKind::Updated)?;
        Logger::info(
            "GRAY_RULE_DELETED",
            &[("namespace", namespace), ("key", key)],
        );
        self.persist();
        Ok(())
    }

    // ==================
    // Resolution
    // ==================

    /// Resolves the effective value of (namespace, key) for one client.
    pub fn resolve(&self, namespace: &str, key: &str, client_id: &str) -> StoreResult<Resolved> {
        let item = self.store.get_item(namespace, key)?;
        let rule = self.rules.find(namespace, key)?;
        gray::resolve(&item, rule.as_ref(), client_id)
    }

    /// Long-poll: answers immediately when the client's fingerprint is
    /// stale, otherwise waits up to `timeout` for a change and re-resolves.
    ///
    /// `Ok(None)` means unchanged within the timeout (or the key no longer
    /// resolves); the client keeps its current value and polls again.
    pub async fn poll(
        &self,
        namespace: &str,
        key: &str,
        client_id: &str,
        fingerprint: Option<&str>,
        timeout: Duration,
    ) -> StoreResult<Option<Resolved>> {
        if let Ok(resolved) = self.resolve(namespace, key, client_id) {
            if fingerprint != Some(resolved.fingerprint.as_str()) {
                return Ok(Some(resolved));
            }
        }

        match self.notifier.wait_for_change(namespace, key, timeout).await? {
            None => Ok(None),
            Some(_) => match self.resolve(namespace, key, client_id) {
                Ok(resolved) => Ok(Some(resolved)),
                Err(_) => Ok(None),
            },
        }
    }

    fn persist(&self) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        let state = match self.export_state() {
            Ok(state) => state,
            Err(err) => {
                Logger::error("SNAPSHOT_FAILED", &[("error", &err.to_string())]);
                return;
            }
        };
        match snapshot::write_snapshot(path, &state) {
            Ok(()) => Logger::info(
                "SNAPSHOT_WRITTEN",
                &[("path", &path.display().to_string())],
            ),
            // The in-memory state stays authoritative; the operator sees
            // the failure and the next mutation retries.
            Err(err) => Logger::error("SNAPSHOT_FAILED", &[("error", &err.to_string())]),
        }
    }

    /// Clones out the full service state.
    pub fn export_state(&self) -> StoreResult<StoreState> {
        let (namespaces, items) = self.store.export()?;
        let rules = self.rules.export()?;
        Ok(StoreState {
            namespaces,
            items,
            rules,
        })
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gray::ServedVersion;

    fn service_with_demo() -> ConfigService {
        let service = ConfigService::new();
        service.create_namespace("demo", "Demo", "").unwrap();
        service
    }

    #[test]
    fn test_resolve_not_found_without_item() {
        let service = service_with_demo();
        let err = service.resolve("demo", "app.yaml", "client-1").unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_resolve_bootstrap_draft() {
        let service = service_with_demo();
        service
            .save_draft("demo", "app.yaml", ConfigFormat::Yaml, "a: 1")
            .unwrap();
        let resolved = service.resolve("demo", "app.yaml", "client-1").unwrap();
        assert_eq!(resolved.served, ServedVersion::Draft);
    }

    #[test]
    fn test_gray_rule_requires_namespace() {
        let service = ConfigService::new();
        let err = service
            .save_gray_rule("missing", "app.yaml", 10, true)
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_gray_rule_without_draft_is_harmless() {
        let service = service_with_demo();
        service
            .save_draft("demo", "app.yaml", ConfigFormat::Yaml, "a: 1")
            .unwrap();
        service.publish("demo", "app.yaml").unwrap();
        // Rule saved for a key whose draft equals published: permitted, and
        // every client still receives the released content.
        service
            .save_gray_rule("demo", "app.yaml", 100, true)
            .unwrap();
        let resolved = service.resolve("demo", "app.yaml", "client-1").unwrap();
        assert_eq!(resolved.value, "a: 1");
    }

    #[test]
    fn test_delete_item_cascades_gray_rule() {
        let service = service_with_demo();
        service
            .save_draft("demo", "app.yaml", ConfigFormat::Yaml, "a: 1")
            .unwrap();
        service
            .save_gray_rule("demo", "app.yaml", 50, true)
            .unwrap();
        service.delete_config_item("demo", "app.yaml").unwrap();
        assert_eq!(
            service.get_gray_rule("demo", "app.yaml").unwrap_err().code(),
            "NOT_FOUND"
        );
    }

    #[test]
    fn test_delete_namespace_cascades_everything() {
        let service = service_with_demo();
        service
            .save_draft("demo", "app.yaml", ConfigFormat::Yaml, "a: 1")
            .unwrap();
        service
            .save_gray_rule("demo", "app.yaml", 50, true)
            .unwrap();
        service.delete_namespace("demo").unwrap();
        assert_eq!(
            service.get_namespace("demo").unwrap_err().code(),
            "NOT_FOUND"
        );
        assert_eq!(
            service.get_gray_rule("demo", "app.yaml").unwrap_err().code(),
            "NOT_FOUND"
        );
    }

    #[tokio::test]
    async fn test_poll_returns_immediately_on_stale_fingerprint() {
        let service = service_with_demo();
        service
            .save_draft("demo", "app.yaml", ConfigFormat::Yaml, "a: 1")
            .unwrap();
        service.publish("demo", "app.yaml").unwrap();

        let resolved = service
            .poll(
                "demo",
                "app.yaml",
                "client-1",
                Some("stale"),
                Duration::from_secs(5),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.value, "a: 1");
    }

    #[tokio::test]
    async fn test_poll_times_out_when_current() {
        let service = service_with_demo();
        service
            .save_draft("demo", "app.yaml", ConfigFormat::Yaml, "a: 1")
            .unwrap();
        service.publish("demo", "app.yaml").unwrap();
        let current = service.resolve("demo", "app.yaml", "client-1").unwrap();

        let outcome = service
            .poll(
                "demo",
                "app.yaml",
                "client-1",
                Some(&current.fingerprint),
                Duration::from_millis(50),
            )
            .await
            .unwrap();
        assert!(outcome.is_none());
    }
}
