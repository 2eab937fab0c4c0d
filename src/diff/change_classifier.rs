use std::sync::Arc;

use tracing::debug;
use tracing::trace;

use crate::decode_record;
use crate::filter::RequiredKeys;
use crate::metrics::REGISTRY_FAILURES;
use crate::registry::ServiceRegistry;
use crate::Endpoint;
use crate::EndpointKey;
use crate::Event;
use crate::MetadataEntry;
use crate::RawChange;
use crate::RegistryKey;
use crate::Result;
use crate::Service;
use crate::ServiceKey;

/// Classifies single key changes into events.
///
/// Endpoint changes are leaf changes: at most one event, using the owning
/// service's current metadata. Service changes cascade to every endpoint of
/// the service when its selection or filtered metadata changes.
pub struct ChangeClassifier<R: ServiceRegistry> {
    registry: Arc<R>,
    keys: RequiredKeys,
}

impl<R: ServiceRegistry> ChangeClassifier<R> {
    pub fn new(
        registry: Arc<R>,
        keys: RequiredKeys,
    ) -> Self {
        Self { registry, keys }
    }

    pub fn keys(&self) -> &RequiredKeys {
        &self.keys
    }

    /// Events produced by `change`.
    ///
    /// A failed registry lookup fails the whole change: no partial cascade is
    /// ever returned.
    pub async fn classify(
        &self,
        change: &RawChange,
    ) -> Result<Vec<Event>> {
        trace!(key = ?change.key, hint = ?change.hint, "classifying change");

        match &change.key {
            RegistryKey::Namespace(name) => {
                debug!(namespace = %name, "namespace changes carry no visible state");
                Ok(Vec::new())
            }
            RegistryKey::Service(key) => self.classify_service_change(key, change).await,
            RegistryKey::Endpoint(key) => {
                let event = self.classify_endpoint_change(key, change).await?;
                Ok(event.into_iter().collect())
            }
        }
    }

    pub async fn classify_endpoint_change(
        &self,
        key: &EndpointKey,
        change: &RawChange,
    ) -> Result<Option<Event>> {
        let previous = decode_record::<Endpoint>(change.previous_value());
        let current = decode_record::<Endpoint>(change.current_value());

        if previous.is_none() && current.is_none() {
            debug!(endpoint = %key, "neither value of the endpoint is valid, skipping");
            return Ok(None);
        }

        let service: Service = self
            .registry
            .get_service(&key.ns_name, &key.serv_name)
            .await
            .map_err(|e| {
                REGISTRY_FAILURES.with_label_values(&["get_service"]).inc();
                e
            })?;

        let Some(metadata) = self.keys.visible_metadata(Some(&service)) else {
            debug!(endpoint = %key, "owning service is not selected, skipping");
            return Ok(None);
        };

        let event = match (previous, current) {
            (None, Some(cur)) => Some(Event::create(&cur, metadata)),
            (Some(prev), None) => Some(Event::delete(&prev, metadata)),
            (Some(prev), Some(cur)) if prev.identity() != cur.identity() => {
                Some(Event::update(&cur, metadata))
            }
            _ => None,
        };

        Ok(event)
    }

    pub async fn classify_service_change(
        &self,
        key: &ServiceKey,
        change: &RawChange,
    ) -> Result<Vec<Event>> {
        let previous = decode_record::<Service>(change.previous_value());
        let current = decode_record::<Service>(change.current_value());

        let was = self.keys.visible_metadata(previous.as_ref());
        let is = self.keys.visible_metadata(current.as_ref());

        if was.is_none() && is.is_none() {
            debug!(service = %key, "service was and is not selected, skipping");
            return Ok(Vec::new());
        }

        let endpoints = self
            .registry
            .list_endpoints(&key.ns_name, &key.name)
            .await
            .map_err(|e| {
                REGISTRY_FAILURES.with_label_values(&["list_endpoints"]).inc();
                e
            })?;

        let (build, metadata): (fn(&Endpoint, Vec<MetadataEntry>) -> Event, _) = match (was, is) {
            (Some(before), None) => (Event::delete, before),
            (None, Some(after)) => (Event::create, after),
            (Some(before), Some(after)) => {
                if before == after {
                    debug!(service = %key, "filtered metadata unchanged, skipping");
                    return Ok(Vec::new());
                }
                (Event::update, after)
            }
            (None, None) => return Ok(Vec::new()),
        };

        debug!(service = %key, endpoints = endpoints.len(), "service change cascades to its endpoints");

        Ok(endpoints
            .iter()
            .map(|endp| build(endp, metadata.clone()))
            .collect())
    }
}
