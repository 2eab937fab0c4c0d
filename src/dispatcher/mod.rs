//! Event coalescing and delivery.
//!
//! Producers hand events to the [`Dispatcher`], which keeps at most one
//! pending event per service instance and flushes everything pending as one
//! batch to an [`Adaptor`].

mod adaptor;
mod coalesce;
mod dispatcher;

pub use adaptor::*;
pub use coalesce::*;
pub use dispatcher::*;
