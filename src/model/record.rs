use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::EndpointKey;
use super::ServiceKey;

pub type Metadata = HashMap<String, String>;

/// Top-level grouping of services
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Namespace {
    pub name: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Service {
    pub name: String,
    pub ns_name: String,
    pub metadata: Metadata,
}

/// A reachable instance of a service.
///
/// `metadata` is kept for registry bookkeeping only: events always carry the
/// owning service's metadata instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Endpoint {
    pub name: String,
    pub serv_name: String,
    pub ns_name: String,
    pub address: String,
    pub port: u16,
    pub metadata: Metadata,
}

impl Service {
    pub fn key(&self) -> ServiceKey {
        ServiceKey::new(&self.ns_name, &self.name)
    }
}

impl Endpoint {
    pub fn key(&self) -> EndpointKey {
        EndpointKey::new(&self.ns_name, &self.serv_name, &self.name)
    }

    pub fn service_key(&self) -> ServiceKey {
        ServiceKey::new(&self.ns_name, &self.serv_name)
    }

    /// The (address, port) pair consumers key on
    pub fn identity(&self) -> (&str, u16) {
        (&self.address, self.port)
    }
}

/// A record as stored in a registry backend.
pub trait RegistryRecord: DeserializeOwned {
    const KIND: &'static str;

    /// False when the identifying names are missing: such a record is
    /// indistinguishable from "no record at all".
    fn is_complete(&self) -> bool;
}

impl RegistryRecord for Namespace {
    const KIND: &'static str = "namespace";

    fn is_complete(&self) -> bool {
        !self.name.is_empty()
    }
}

impl RegistryRecord for Service {
    const KIND: &'static str = "service";

    fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.ns_name.is_empty()
    }
}

impl RegistryRecord for Endpoint {
    const KIND: &'static str = "endpoint";

    fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.serv_name.is_empty() && !self.ns_name.is_empty()
    }
}

/// Decodes a stored record.
///
/// Missing bytes, undecodable bytes and records without names all decode to
/// `None`: a malformed record is never an error.
pub fn decode_record<T: RegistryRecord>(raw: Option<&[u8]>) -> Option<T> {
    let raw = raw.filter(|r| !r.is_empty())?;

    match serde_yaml::from_slice::<T>(raw) {
        Ok(record) if record.is_complete() => Some(record),
        Ok(_) => {
            debug!(kind = T::KIND, "record has no names, treating as absent");
            None
        }
        Err(e) => {
            debug!(kind = T::KIND, error = %e, "could not decode record, treating as absent");
            None
        }
    }
}

/// Encodes a record the way backends store it.
pub fn encode_record<T: Serialize>(record: &T) -> Result<Vec<u8>, serde_yaml::Error> {
    serde_yaml::to_string(record).map(String::into_bytes)
}
