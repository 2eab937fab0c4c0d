use std::collections::BTreeMap;

use bytes::Bytes;
use futures::StreamExt;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;

use super::KvChange;
use super::KvChangeStream;
use super::KvClient;
use crate::constants::WATCH_CHANNEL_SIZE;
use crate::encode_record;
use crate::RegistryError;
use crate::RegistryKey;
use crate::Result;

/// In-memory key-value store with change notification.
///
/// Writers see their changes broadcast to every active watch in write order.
/// Watches that fall more than the channel capacity behind receive an error
/// item and should re-read the state.
#[derive(Debug)]
pub struct MemKv {
    data: RwLock<BTreeMap<String, Bytes>>,
    changes: broadcast::Sender<KvChange>,
}

impl Default for MemKv {
    fn default() -> Self {
        Self::new()
    }
}

impl MemKv {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(WATCH_CHANNEL_SIZE);
        Self {
            data: RwLock::new(BTreeMap::new()),
            changes,
        }
    }

    /// Stores `value` under `key`, returning the previous value
    pub fn put(
        &self,
        key: &str,
        value: impl Into<Bytes>,
    ) -> Option<Bytes> {
        let value = value.into();
        let mut data = self.data.write();
        let previous = data.insert(key.to_string(), value.clone());

        // Sent under the write lock so watchers observe writes in order
        let _ = self.changes.send(KvChange {
            key: key.to_string(),
            previous: previous.clone(),
            current: Some(value),
        });

        previous
    }

    pub fn delete(
        &self,
        key: &str,
    ) -> Option<Bytes> {
        let mut data = self.data.write();
        let previous = data.remove(key);

        if previous.is_some() {
            let _ = self.changes.send(KvChange {
                key: key.to_string(),
                previous: previous.clone(),
                current: None,
            });
        }

        previous
    }

    /// Encodes `record` and stores it at the path of `key`
    pub fn put_record<T: Serialize>(
        &self,
        prefix: &str,
        key: &RegistryKey,
        record: &T,
    ) -> Result<Option<Bytes>> {
        let raw = encode_record(record).map_err(|e| RegistryError::Backend(e.to_string()))?;
        Ok(self.put(&key.to_path(prefix), raw))
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

#[async_trait::async_trait]
impl KvClient for MemKv {
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<Bytes>> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn get_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, Bytes)>> {
        let data = self.data.read();
        let pairs = data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(pairs)
    }

    async fn watch_prefix(
        &self,
        prefix: &str,
        cancel: CancellationToken,
    ) -> Result<KvChangeStream> {
        let prefix = prefix.to_string();
        let stream = BroadcastStream::new(self.changes.subscribe())
            .filter_map(move |item| {
                let item: Option<Result<KvChange>> = match item {
                    Ok(change) if change.key.starts_with(&prefix) => Some(Ok(change)),
                    Ok(_) => None,
                    Err(BroadcastStreamRecvError::Lagged(missed)) => Some(Err(RegistryError::Backend(
                        format!("watch lagged behind by {missed} changes"),
                    )
                    .into())),
                };
                futures::future::ready(item)
            })
            .take_until(cancel.cancelled_owned());

        Ok(Box::pin(stream))
    }
}
