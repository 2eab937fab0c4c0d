use crate::filter::RequiredKeys;
use crate::Endpoint;
use crate::Event;
use crate::MetadataEntry;
use crate::Snapshot;

/// Filtered metadata of the endpoint's owner, if the endpoint is visible in
/// `snapshot`
fn visible_in(
    snapshot: &Snapshot,
    endpoint: &Endpoint,
    keys: &RequiredKeys,
) -> Option<Vec<MetadataEntry>> {
    keys.visible_metadata(snapshot.service_of(endpoint))
}

/// Events turning the visible part of `previous` into the visible part of
/// `current`.
///
/// An endpoint is visible when its owning service is present and selected.
/// Visible endpoints whose identity and owner metadata did not change yield
/// nothing.
pub fn diff_snapshots(
    previous: &Snapshot,
    current: &Snapshot,
    keys: &RequiredKeys,
) -> Vec<Event> {
    let mut events = Vec::new();

    for (key, endp) in &current.endpoints {
        let Some(metadata) = visible_in(current, endp, keys) else {
            continue;
        };

        let before = previous
            .endpoints
            .get(key)
            .and_then(|prev| visible_in(previous, prev, keys).map(|m| (prev, m)));

        match before {
            None => events.push(Event::create(endp, metadata)),
            Some((prev, prev_metadata)) => {
                if prev.identity() != endp.identity() || prev_metadata != metadata {
                    events.push(Event::update(endp, metadata));
                }
            }
        }
    }

    for (key, prev) in &previous.endpoints {
        let Some(prev_metadata) = visible_in(previous, prev, keys) else {
            continue;
        };

        let still_visible = current
            .endpoints
            .get(key)
            .is_some_and(|endp| visible_in(current, endp, keys).is_some());

        if !still_visible {
            events.push(Event::delete(prev, prev_metadata));
        }
    }

    events
}
