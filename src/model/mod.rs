//! Registry object model shared by every backend, the differ and the
//! change classifier.

mod change;
mod event;
mod key;
mod record;
mod snapshot;

pub use change::*;
pub use event::*;
pub use key::*;
pub use record::*;
pub use snapshot::*;
