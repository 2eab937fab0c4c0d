use bytes::Bytes;

use super::RegistryKey;

/// Kind of operation the backend reported for a change.
///
/// Only used to label log lines: classification always looks at the
/// previous/current values themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeHint {
    Put,
    Delete,
}

/// A single change notification for one registry key
#[derive(Debug, Clone, PartialEq)]
pub struct RawChange {
    pub key: RegistryKey,
    /// Value before the change, `None` if the key did not exist
    pub previous: Option<Bytes>,
    /// Value after the change, `None` if the key no longer exists
    pub current: Option<Bytes>,
    pub hint: ChangeHint,
}

impl RawChange {
    pub fn new(
        key: RegistryKey,
        previous: Option<Bytes>,
        current: Option<Bytes>,
    ) -> Self {
        let hint = if current.is_some() {
            ChangeHint::Put
        } else {
            ChangeHint::Delete
        };

        Self {
            key,
            previous,
            current,
            hint,
        }
    }

    pub fn previous_value(&self) -> Option<&[u8]> {
        self.previous.as_deref()
    }

    pub fn current_value(&self) -> Option<&[u8]> {
        self.current.as_deref()
    }
}
