use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use super::Endpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Create,
    Update,
    Delete,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Create => "create",
            EventKind::Update => "update",
            EventKind::Delete => "delete",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

impl MetadataEntry {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Service instance as seen by the adaptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub name: String,
    pub address: String,
    pub port: u16,
    pub metadata: Vec<MetadataEntry>,
}

/// One change reported to the adaptor.
///
/// Serializes as `{"event": "create", "service": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "event")]
    pub kind: EventKind,
    pub service: ServiceInstance,
}

impl Event {
    pub fn new(
        kind: EventKind,
        endpoint: &Endpoint,
        metadata: Vec<MetadataEntry>,
    ) -> Self {
        Self {
            kind,
            service: ServiceInstance {
                name: endpoint.name.clone(),
                address: endpoint.address.clone(),
                port: endpoint.port,
                metadata,
            },
        }
    }

    pub fn create(
        endpoint: &Endpoint,
        metadata: Vec<MetadataEntry>,
    ) -> Self {
        Self::new(EventKind::Create, endpoint, metadata)
    }

    pub fn update(
        endpoint: &Endpoint,
        metadata: Vec<MetadataEntry>,
    ) -> Self {
        Self::new(EventKind::Update, endpoint, metadata)
    }

    pub fn delete(
        endpoint: &Endpoint,
        metadata: Vec<MetadataEntry>,
    ) -> Self {
        Self::new(EventKind::Delete, endpoint, metadata)
    }

    /// Service-instance name, the key events are coalesced on
    pub fn name(&self) -> &str {
        &self.service.name
    }

    pub fn identity(&self) -> (&str, u16) {
        (&self.service.address, self.service.port)
    }
}
