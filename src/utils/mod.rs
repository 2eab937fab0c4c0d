mod async_task;
mod net;
mod path;

pub use async_task::*;
pub use net::*;
pub use path::*;

#[cfg(test)]
mod async_task_test;
