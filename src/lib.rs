//! Registry reader: observes a service registry and reports the service
//! instances of selected services to an adaptor as a coalesced stream of
//! create/update/delete events.
//!
//! The pipeline, leaves first:
//! - [`model`]: registry objects, keys, snapshots and events
//! - [`RequiredKeys`]: which services are observed
//! - [`diff`]: snapshot diffing and per-change classification
//! - [`dispatcher`]: per-instance coalescing and batch delivery
//! - [`orchestrator`]: poll or watch loop tying a registry to a dispatcher
//!
//! Registries are reached through [`registry::ServiceRegistry`]; this crate
//! provides one laid out in a key-value store.

mod config;
mod constants;
mod errors;
mod filter;
pub mod model;

pub mod diff;
pub mod dispatcher;
pub mod metrics;
pub mod orchestrator;
pub mod registry;
pub mod utils;

pub use self::config::*;
pub use constants::*;
pub use errors::*;
pub use filter::*;
pub use model::*;
