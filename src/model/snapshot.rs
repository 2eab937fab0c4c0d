use std::collections::BTreeMap;

use super::decode_record;
use super::Endpoint;
use super::EndpointKey;
use super::Namespace;
use super::RawChange;
use super::RegistryKey;
use super::Service;
use super::ServiceKey;

/// One consistent observation of a registry.
///
/// Never mutated once handed out: a new poll cycle (or a new watch
/// notification) produces a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub namespaces: BTreeMap<String, Namespace>,
    pub services: BTreeMap<ServiceKey, Service>,
    pub endpoints: BTreeMap<EndpointKey, Endpoint>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(
        mut self,
        namespace: Namespace,
    ) -> Self {
        self.namespaces.insert(namespace.name.clone(), namespace);
        self
    }

    pub fn with_service(
        mut self,
        service: Service,
    ) -> Self {
        self.services.insert(service.key(), service);
        self
    }

    pub fn with_endpoint(
        mut self,
        endpoint: Endpoint,
    ) -> Self {
        self.endpoints.insert(endpoint.key(), endpoint);
        self
    }

    pub fn service(
        &self,
        key: &ServiceKey,
    ) -> Option<&Service> {
        self.services.get(key)
    }

    /// Owning service of an endpoint, if present in this snapshot
    pub fn service_of(
        &self,
        endpoint: &Endpoint,
    ) -> Option<&Service> {
        self.services.get(&endpoint.service_key())
    }

    pub fn endpoints_of<'a>(
        &'a self,
        key: &'a ServiceKey,
    ) -> impl Iterator<Item = &'a Endpoint> + 'a {
        self.endpoints
            .iter()
            .filter(move |(k, _)| k.ns_name == key.ns_name && k.serv_name == key.name)
            .map(|(_, e)| e)
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty() && self.services.is_empty() && self.endpoints.is_empty()
    }

    /// Returns a new snapshot with one change applied.
    ///
    /// A current value that does not decode removes the object, the same way
    /// classification treats it as absent.
    pub fn with_change(
        &self,
        change: &RawChange,
    ) -> Snapshot {
        let mut next = self.clone();

        match &change.key {
            RegistryKey::Namespace(name) => {
                match decode_record::<Namespace>(change.current_value()) {
                    Some(ns) => {
                        next.namespaces.insert(name.clone(), ns);
                    }
                    None => {
                        next.namespaces.remove(name);
                    }
                }
            }
            RegistryKey::Service(key) => match decode_record::<Service>(change.current_value()) {
                Some(serv) => {
                    next.services.insert(key.clone(), serv);
                }
                None => {
                    next.services.remove(key);
                }
            },
            RegistryKey::Endpoint(key) => match decode_record::<Endpoint>(change.current_value()) {
                Some(endp) => {
                    next.endpoints.insert(key.clone(), endp);
                }
                None => {
                    next.endpoints.remove(key);
                }
            },
        }

        next
    }
}
