//! Service registry collaborators.
//!
//! The reconciliation pipeline only depends on [`ServiceRegistry`]. Each kind
//! of registry (key-value store, cloud discovery service, orchestrator) is one
//! implementation of it; this crate ships the key-value one, [`KvRegistry`],
//! on top of any [`KvClient`].

mod file_kv;
mod kv;
mod mem_kv;

pub use file_kv::*;
pub use kv::*;
pub use mem_kv::*;


use std::pin::Pin;

use futures::Stream;
#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;

use crate::Endpoint;
use crate::RawChange;
use crate::Result;
use crate::Service;
use crate::Snapshot;

/// Stream of change notifications produced by [`ServiceRegistry::watch`].
///
/// An `Err` item reports a gap (e.g. the subscription lagged behind) without
/// ending the stream.
pub type RawChangeStream = Pin<Box<dyn Stream<Item = Result<RawChange>> + Send>>;

#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ServiceRegistry: Send + Sync + 'static {
    /// Full observation of the registry, used by poll cycles and to seed a
    /// watch.
    async fn get_current_state(&self) -> Result<Snapshot>;

    /// Subscribes to changes. The stream ends once `cancel` fires.
    async fn watch(
        &self,
        cancel: CancellationToken,
    ) -> Result<RawChangeStream>;

    /// Current owning service of an endpoint; `RegistryError::NotFound` when
    /// it does not exist.
    async fn get_service(
        &self,
        ns_name: &str,
        serv_name: &str,
    ) -> Result<Service>;

    async fn list_endpoints(
        &self,
        ns_name: &str,
        serv_name: &str,
    ) -> Result<Vec<Endpoint>>;
}
