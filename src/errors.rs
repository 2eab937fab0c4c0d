//! Error hierarchy for the registry reader
//!
//! Errors are grouped by the collaborator that produced them: the registry
//! backend being observed, the adaptor receiving event batches, and the
//! configuration layer.

use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration validation failures
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Failures reported by (or while talking to) a service registry
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Failures while handing a batch to the adaptor
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Lookup of an owning object returned nothing
    #[error("{kind} {path} not found")]
    NotFound { kind: &'static str, path: String },

    /// Backend-specific failure (listing, reading, connecting)
    #[error("Registry backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Undecodable document at the backend level (not a single record)
    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The change subscription ended while the reader was still running
    #[error("Watch stream closed")]
    WatchClosed,

    #[error("Registry call timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Adaptor request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Adaptor answered with a non-success status code
    #[error("Adaptor rejected batch with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Invalid adaptor url: {0}")]
    InvalidUrl(String),
}

impl RegistryError {
    pub fn service_not_found(
        ns_name: &str,
        serv_name: &str,
    ) -> Self {
        RegistryError::NotFound {
            kind: "service",
            path: format!("{ns_name}/{serv_name}"),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }
}
