//! Key-value store backed by a YAML file.
//!
//! The file is a mapping from key to record:
//!
//! ```yaml
//! /service-registry/namespaces/ns/services/srv:
//!   name: srv
//!   nsName: ns
//!   metadata:
//!     traffic-profile: gold
//! /service-registry/namespaces/ns/services/srv/endpoints/endp:
//!   name: endp
//!   servName: srv
//!   nsName: ns
//!   address: 10.0.0.1
//!   port: 8080
//! ```
//!
//! Watching re-reads the file on every refresh tick and reports the keys
//! whose value changed since the previous read.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use super::KvChange;
use super::KvChangeStream;
use super::KvClient;
use crate::constants::WATCH_CHANNEL_SIZE;
use crate::RegistryError;
use crate::Result;

type KvMap = BTreeMap<String, Bytes>;

#[derive(Debug, Clone)]
pub struct FileKv {
    path: PathBuf,
    refresh_interval: Duration,
}

impl FileKv {
    pub fn new(
        path: impl AsRef<Path>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            refresh_interval,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<KvMap> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(RegistryError::Io)?;

        parse_kv_document(&content, &self.path.display().to_string())
    }
}

/// Parses the file content into raw key/value pairs. Values that are not
/// plain strings are re-encoded as YAML.
pub(crate) fn parse_kv_document(
    content: &str,
    origin: &str,
) -> Result<KvMap> {
    if content.trim().is_empty() {
        return Ok(KvMap::new());
    }

    let document: BTreeMap<String, serde_yaml::Value> =
        serde_yaml::from_str(content).map_err(|source| RegistryError::Decode {
            what: origin.to_string(),
            source,
        })?;

    let mut pairs = KvMap::new();
    for (key, value) in document {
        let raw = match value {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Null => continue,
            other => serde_yaml::to_string(&other).map_err(|source| RegistryError::Decode {
                what: key.clone(),
                source,
            })?,
        };
        pairs.insert(key, Bytes::from(raw));
    }

    Ok(pairs)
}

/// Changed keys between two reads, restricted to `prefix`.
///
/// Puts come first in key order, so a parent record precedes its children.
/// Removals follow in reverse key order, children before their parent.
pub(crate) fn diff_kv(
    previous: &KvMap,
    current: &KvMap,
    prefix: &str,
) -> Vec<KvChange> {
    let mut changes = Vec::new();

    for (key, value) in current.iter().filter(|(k, _)| k.starts_with(prefix)) {
        let before = previous.get(key);
        if before != Some(value) {
            changes.push(KvChange {
                key: key.clone(),
                previous: before.cloned(),
                current: Some(value.clone()),
            });
        }
    }

    for (key, value) in previous.iter().rev().filter(|(k, _)| k.starts_with(prefix)) {
        if !current.contains_key(key) {
            changes.push(KvChange {
                key: key.clone(),
                previous: Some(value.clone()),
                current: None,
            });
        }
    }

    changes
}

#[async_trait::async_trait]
impl KvClient for FileKv {
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<Bytes>> {
        Ok(self.load().await?.remove(key))
    }

    async fn get_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, Bytes)>> {
        let pairs = self
            .load()
            .await?
            .into_iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();

        Ok(pairs)
    }

    async fn watch_prefix(
        &self,
        prefix: &str,
        cancel: CancellationToken,
    ) -> Result<KvChangeStream> {
        let mut last = self.load().await?;
        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_SIZE);
        let store = self.clone();
        let prefix = prefix.to_string();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(store.refresh_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let current = match store.load().await {
                    Ok(current) => current,
                    Err(e) => {
                        warn!(path = %store.path.display(), error = %e, "could not re-read registry file");
                        continue;
                    }
                };

                for change in diff_kv(&last, &current, &prefix) {
                    if tx.send(Ok(change)).await.is_err() {
                        debug!("file watch receiver dropped");
                        return;
                    }
                }
                last = current;
            }

            debug!(path = %store.path.display(), "file watch stopped");
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
