//! Change notification for long-polling clients
//!
//! Fan-out of publish/delete events per (namespace, key). A polling client
//! whose fingerprint is already current parks on `wait_for_change` until a
//! writer notifies or the timeout elapses. Draft saves do not notify: a
//! draft only becomes visible through gray routing, which every poll
//! re-evaluates anyway.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::store::{ItemKey, StoreError, StoreResult};

const CHANNEL_CAPACITY: usize = 16;

/// What happened to a config key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Updated,
    Deleted,
}

/// A change to one config key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub namespace: String,
    pub key: String,
    pub kind: ChangeKind,
}

/// Per-key broadcast hub
pub struct ChangeNotifier {
    channels: RwLock<HashMap<ItemKey, broadcast::Sender<ChangeEvent>>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribes to changes of one key, creating the channel on first use.
    pub fn subscribe(
        &self,
        namespace: &str,
        key: &str,
    ) -> StoreResult<broadcast::Receiver<ChangeEvent>> {
        let ikey = ItemKey::new(namespace, key);
        {
            let channels = self
                .channels
                .read()
                .map_err(|_| StoreError::poisoned("notifier"))?;
            if let Some(sender) = channels.get(&ikey) {
                return Ok(sender.subscribe());
            }
        }
        let mut channels = self
            .channels
            .write()
            .map_err(|_| StoreError::poisoned("notifier"))?;
        let sender = channels
            .entry(ikey)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Ok(sender.subscribe())
    }

    /// Notifies subscribers of a change. Keys nobody listens on are a no-op.
    pub fn notify(&self, namespace: &str, key: &str, kind: ChangeKind) -> StoreResult<()> {
        let channels = self
            .channels
            .read()
            .map_err(|_| StoreError::poisoned("notifier"))?;
        if let Some(sender) = channels.get(&ItemKey::new(namespace, key)) {
            // A send error only means there are currently no receivers.
            let _ = sender.send(ChangeEvent {
                namespace: namespace.to_string(),
                key: key.to_string(),
                kind,
            });
        }
        Ok(())
    }

    /// Waits for the next change to (namespace, key), up to `timeout`.
    ///
    /// Returns `None` on timeout. Lagged receivers are treated as changed:
    /// missing an intermediate event still means the client must re-fetch.
    /// The key's channel is reclaimed once its last waiter leaves, so polls
    /// against arbitrary keys do not grow the map without bound.
    pub async fn wait_for_change(
        &self,
        namespace: &str,
        key: &str,
        timeout: Duration,
    ) -> StoreResult<Option<ChangeEvent>> {
        let mut receiver = self.subscribe(namespace, key)?;
        let outcome = match tokio::time::timeout(timeout, receiver.recv()).await {
            Ok(Ok(event)) => Some(event),
            Ok(Err(broadcast::error::RecvError::Lagged(_))) => Some(ChangeEvent {
                namespace: namespace.to_string(),
                key: key.to_string(),
                kind: ChangeKind::Updated,
            }),
            Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => None,
        };
        drop(receiver);
        self.reclaim(&ItemKey::new(namespace, key))?;
        Ok(outcome)
    }

    /// Removes the key's channel when no receiver is left on it.
    ///
    /// Subscribers attach while holding the map lock, so a zero receiver
    /// count observed under the write lock cannot race a new waiter.
    fn reclaim(&self, ikey: &ItemKey) -> StoreResult<()> {
        let mut channels = self
            .channels
            .write()
            .map_err(|_| StoreError::poisoned("notifier"))?;
        if let Some(sender) = channels.get(ikey) {
            if sender.receiver_count() == 0 {
                channels.remove(ikey);
            }
        }
        Ok(())
    }

    #[cfg(test)]
    fn channel_count(&self) -> usize {
        self.channels.read().unwrap().len()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
