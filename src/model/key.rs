//! Unique keys of registry objects and their path layout in key-value
//! backends:
//!
//! ```text
//! {prefix}/namespaces/{ns}
//! {prefix}/namespaces/{ns}/services/{srv}
//! {prefix}/namespaces/{ns}/services/{srv}/endpoints/{ep}
//! ```

use std::fmt;

use crate::constants::ENDPOINTS_SEGMENT;
use crate::constants::NAMESPACES_SEGMENT;
use crate::constants::SERVICES_SEGMENT;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceKey {
    pub ns_name: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EndpointKey {
    pub ns_name: String,
    pub serv_name: String,
    pub name: String,
}

impl ServiceKey {
    pub fn new(
        ns_name: &str,
        name: &str,
    ) -> Self {
        Self {
            ns_name: ns_name.to_string(),
            name: name.to_string(),
        }
    }
}

impl EndpointKey {
    pub fn new(
        ns_name: &str,
        serv_name: &str,
        name: &str,
    ) -> Self {
        Self {
            ns_name: ns_name.to_string(),
            serv_name: serv_name.to_string(),
            name: name.to_string(),
        }
    }

    pub fn service_key(&self) -> ServiceKey {
        ServiceKey::new(&self.ns_name, &self.serv_name)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}/{}", self.ns_name, self.name)
    }
}

impl fmt::Display for EndpointKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}/{}/{}", self.ns_name, self.serv_name, self.name)
    }
}

/// Shape of a key found under the registry prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegistryKey {
    Namespace(String),
    Service(ServiceKey),
    Endpoint(EndpointKey),
}

impl RegistryKey {
    /// Parses a raw backend key.
    ///
    /// Returns `None` for keys outside `prefix` or not following the layout.
    pub fn parse(
        prefix: &str,
        raw: &str,
    ) -> Option<Self> {
        let rest = raw.strip_prefix(prefix)?.strip_prefix('/')?;
        let segments: Vec<&str> = rest.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        match segments.as_slice() {
            [NAMESPACES_SEGMENT, ns] => Some(RegistryKey::Namespace(ns.to_string())),
            [NAMESPACES_SEGMENT, ns, SERVICES_SEGMENT, srv] => {
                Some(RegistryKey::Service(ServiceKey::new(ns, srv)))
            }
            [NAMESPACES_SEGMENT, ns, SERVICES_SEGMENT, srv, ENDPOINTS_SEGMENT, ep] => {
                Some(RegistryKey::Endpoint(EndpointKey::new(ns, srv, ep)))
            }
            _ => None,
        }
    }

    pub fn to_path(
        &self,
        prefix: &str,
    ) -> String {
        match self {
            RegistryKey::Namespace(ns) => namespace_path(prefix, ns),
            RegistryKey::Service(k) => service_path(prefix, &k.ns_name, &k.name),
            RegistryKey::Endpoint(k) => endpoint_path(prefix, &k.ns_name, &k.serv_name, &k.name),
        }
    }
}

impl From<ServiceKey> for RegistryKey {
    fn from(key: ServiceKey) -> Self {
        RegistryKey::Service(key)
    }
}

impl From<EndpointKey> for RegistryKey {
    fn from(key: EndpointKey) -> Self {
        RegistryKey::Endpoint(key)
    }
}

pub fn namespace_path(
    prefix: &str,
    ns_name: &str,
) -> String {
    format!("{prefix}/{NAMESPACES_SEGMENT}/{ns_name}")
}

pub fn service_path(
    prefix: &str,
    ns_name: &str,
    serv_name: &str,
) -> String {
    format!(
        "{}/{SERVICES_SEGMENT}/{serv_name}",
        namespace_path(prefix, ns_name)
    )
}

/// Prefix under which all endpoints of one service live (trailing slash
/// included so `srv` never matches `srv-2`).
pub fn endpoints_prefix(
    prefix: &str,
    ns_name: &str,
    serv_name: &str,
) -> String {
    format!(
        "{}/{ENDPOINTS_SEGMENT}/",
        service_path(prefix, ns_name, serv_name)
    )
}

pub fn endpoint_path(
    prefix: &str,
    ns_name: &str,
    serv_name: &str,
    endp_name: &str,
) -> String {
    format!("{}{endp_name}", endpoints_prefix(prefix, ns_name, serv_name))
}
