//! Publish pipeline: promotion of drafts to published versions
//!
//! The atomic slot swap itself lives on the version store (under the item's
//! write lock); the pipeline adds the surrounding orchestration: change
//! notification and the audit log line. Mutation of the version store by
//! publishing happens only through this pipeline.

use std::sync::Arc;

use crate::notify::{ChangeKind, ChangeNotifier};
use crate::observability::Logger;
use crate::store::{ConfigVersion, StoreResult, VersionStore};

/// Orchestrates draft → published promotion
pub struct PublishPipeline {
    store: Arc<VersionStore>,
    notifier: Arc<ChangeNotifier>,
}

impl PublishPipeline {
    pub fn new(store: Arc<VersionStore>, notifier: Arc<ChangeNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Publishes the draft of (namespace, key).
    ///
    /// Fails with FailedPrecondition when no draft exists. When the draft
    /// fingerprint equals the current published fingerprint this succeeds
    /// without minting a version. Pollers are notified either way; a waker
    /// that then sees an unchanged fingerprint simply resumes waiting.
    pub fn publish(&self, namespace: &str, key: &str) -> StoreResult<ConfigVersion> {
        let version = self.store.publish(namespace, key)?;
        self.notifier.notify(namespace, key, ChangeKind::Updated)?;
        Logger::info(
            "CONFIG_PUBLISHED",
            &[
                ("namespace", namespace),
                ("key", key),
                ("version", &version.version().to_string()),
                ("fingerprint", version.fingerprint()),
            ],
        );
        Ok(version)
    }
}
