//! Registry laid out in a key-value store.
//!
//! Every object is one key holding a YAML record (see
//! [`RegistryKey`](crate::RegistryKey) for the layout). Change notifications
//! come straight from the store's watch, carrying both the previous and the
//! current value of the key.

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;
use futures::StreamExt;
#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use super::RawChangeStream;
use super::ServiceRegistry;
use crate::decode_record;
use crate::endpoints_prefix;
use crate::service_path;
use crate::utils::sanitize_prefix;
use crate::Endpoint;
use crate::Namespace;
use crate::RawChange;
use crate::RegistryError;
use crate::RegistryKey;
use crate::Result;
use crate::Service;
use crate::Snapshot;

/// A change of one key as reported by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvChange {
    pub key: String,
    pub previous: Option<Bytes>,
    pub current: Option<Bytes>,
}

pub type KvChangeStream = Pin<Box<dyn Stream<Item = Result<KvChange>> + Send>>;

#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait KvClient: Send + Sync + 'static {
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<Bytes>>;

    /// All pairs whose key starts with `prefix`, ordered by key
    async fn get_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, Bytes)>>;

    async fn watch_prefix(
        &self,
        prefix: &str,
        cancel: CancellationToken,
    ) -> Result<KvChangeStream>;
}

pub struct KvRegistry<K: KvClient> {
    kv: Arc<K>,
    prefix: String,
}

impl<K: KvClient> KvRegistry<K> {
    pub fn new(
        kv: Arc<K>,
        prefix: &str,
    ) -> Self {
        Self {
            kv,
            prefix: sanitize_prefix(prefix),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn kv(&self) -> &Arc<K> {
        &self.kv
    }

    fn watched_prefix(&self) -> String {
        format!("{}/", self.prefix)
    }
}

#[async_trait::async_trait]
impl<K: KvClient> ServiceRegistry for KvRegistry<K> {
    async fn get_current_state(&self) -> Result<Snapshot> {
        let pairs = self.kv.get_prefix(&self.watched_prefix()).await?;
        let mut snapshot = Snapshot::new();

        for (raw_key, value) in pairs {
            let Some(key) = RegistryKey::parse(&self.prefix, &raw_key) else {
                continue;
            };

            // A record stored under somebody else's key is as good as malformed.
            match &key {
                RegistryKey::Namespace(name) => match decode_record::<Namespace>(Some(&value)) {
                    Some(ns) if &ns.name == name => snapshot = snapshot.with_namespace(ns),
                    _ => debug!(key = %raw_key, "skipping invalid namespace record"),
                },
                RegistryKey::Service(k) => match decode_record::<Service>(Some(&value)) {
                    Some(serv) if &serv.key() == k => snapshot = snapshot.with_service(serv),
                    _ => debug!(key = %raw_key, "skipping invalid service record"),
                },
                RegistryKey::Endpoint(k) => match decode_record::<Endpoint>(Some(&value)) {
                    Some(endp) if &endp.key() == k => snapshot = snapshot.with_endpoint(endp),
                    _ => debug!(key = %raw_key, "skipping invalid endpoint record"),
                },
            }
        }

        Ok(snapshot)
    }

    async fn watch(
        &self,
        cancel: CancellationToken,
    ) -> Result<RawChangeStream> {
        let prefix = self.prefix.clone();
        let changes = self.kv.watch_prefix(&self.watched_prefix(), cancel).await?;

        let stream = changes.filter_map(move |item| {
            let raw = match item {
                Ok(change) => match RegistryKey::parse(&prefix, &change.key) {
                    Some(key) => Some(Ok(RawChange::new(key, change.previous, change.current))),
                    None => {
                        debug!(key = %change.key, "ignoring change to unknown key");
                        None
                    }
                },
                Err(e) => Some(Err(e)),
            };
            futures::future::ready(raw)
        });

        Ok(Box::pin(stream))
    }

    async fn get_service(
        &self,
        ns_name: &str,
        serv_name: &str,
    ) -> Result<Service> {
        let value = self.kv.get(&service_path(&self.prefix, ns_name, serv_name)).await?;

        decode_record::<Service>(value.as_deref())
            .ok_or_else(|| RegistryError::service_not_found(ns_name, serv_name).into())
    }

    async fn list_endpoints(
        &self,
        ns_name: &str,
        serv_name: &str,
    ) -> Result<Vec<Endpoint>> {
        let pairs = self
            .kv
            .get_prefix(&endpoints_prefix(&self.prefix, ns_name, serv_name))
            .await?;

        let endpoints = pairs
            .into_iter()
            .filter_map(|(key, value)| {
                let endp = decode_record::<Endpoint>(Some(&value));
                if endp.is_none() {
                    warn!(key = %key, "skipping invalid endpoint while listing");
                }
                endp
            })
            .collect();

        Ok(endpoints)
    }
}
