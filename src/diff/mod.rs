//! Turning registry state into events.
//!
//! [`diff_snapshots`] compares two complete observations (poll mode);
//! [`ChangeClassifier`] looks at one key change at a time (watch mode),
//! asking the registry for the context a single key does not carry.

mod change_classifier;
mod snapshot_differ;

pub use change_classifier::*;
pub use snapshot_differ::*;
