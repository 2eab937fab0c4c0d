//! Drives a registry in poll or watch mode and feeds the dispatcher.

mod orchestrator;

pub use orchestrator::*;
