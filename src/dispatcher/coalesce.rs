use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::Event;
use crate::EventKind;

/// What happened to an event when it reached the pending queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoalesceOutcome {
    /// Nothing was pending for the instance
    Stored,
    /// A pending event of the same kind (or an Update followed by a Delete)
    /// was overwritten
    Replaced,
    /// A pending Create was cancelled out by a Delete
    Cancelled,
    /// A pending Delete was followed by a Create or Update; an Update is kept
    Revived,
    /// Create/Update mix: the pending kind is kept with the newer payload
    Merged,
}

impl CoalesceOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoalesceOutcome::Stored => "stored",
            CoalesceOutcome::Replaced => "replaced",
            CoalesceOutcome::Cancelled => "cancelled",
            CoalesceOutcome::Revived => "revived",
            CoalesceOutcome::Merged => "merged",
        }
    }
}

/// At most one outstanding event per service-instance name.
///
/// Entries are keyed on the endpoint name alone, not on namespace and
/// service: two endpoints sharing a name in different services replace each
/// other while pending. Adaptors identify instances by name too.
#[derive(Debug, Default)]
pub struct PendingQueue {
    entries: BTreeMap<String, Event>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        incoming: Event,
    ) -> CoalesceOutcome {
        let mut slot = match self.entries.entry(incoming.name().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(incoming);
                return CoalesceOutcome::Stored;
            }
            Entry::Occupied(slot) => slot,
        };

        let pending = slot.get().kind;
        match (pending, incoming.kind) {
            (pending, kind) if pending == kind => {
                slot.insert(incoming);
                CoalesceOutcome::Replaced
            }
            (EventKind::Create, EventKind::Delete) => {
                slot.remove();
                CoalesceOutcome::Cancelled
            }
            (_, EventKind::Delete) => {
                slot.insert(incoming);
                CoalesceOutcome::Replaced
            }
            (EventKind::Delete, _) => {
                slot.insert(Event {
                    kind: EventKind::Update,
                    service: incoming.service,
                });
                CoalesceOutcome::Revived
            }
            _ => {
                slot.get_mut().service = incoming.service;
                CoalesceOutcome::Merged
            }
        }
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&Event> {
        self.entries.get(name)
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.entries.values()
    }

    /// Removes everything pending, ordered by instance name
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.entries).into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
