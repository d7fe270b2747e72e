//! Snapshot comparison: turns two consecutive polls into lifecycle events.

use driftnet_types::LifecycleEvent;

use crate::snapshot::SnapshotSet;

/// Compares `current` against the previously retained poll and returns
/// lifecycle events in dispatch order.
///
/// With no previous poll, every torrent yields `Exists` and nothing else:
/// startup discovers pre-existing daemon state rather than reporting it as
/// churn. Otherwise each torrent present in both polls is checked for a
/// directory move, a progress change and a status transition, in that order;
/// new hashes yield `Added`, and hashes that vanished yield `Deleted` after
/// all matched-torrent events.
///
/// The caller retains `current` as the new previous state unconditionally,
/// however many events fired.
pub fn diff(previous: Option<&SnapshotSet>, current: &SnapshotSet) -> Vec<LifecycleEvent> {
    let Some(previous) = previous else {
        return current.iter().cloned().map(LifecycleEvent::Exists).collect();
    };

    let mut events = Vec::new();
    for snapshot in current.iter() {
        match previous.get(&snapshot.hash_string) {
            None => events.push(LifecycleEvent::Added(snapshot.clone())),
            Some(earlier) => {
                if snapshot.download_dir != earlier.download_dir {
                    events.push(LifecycleEvent::Moved(snapshot.clone()));
                }
                if snapshot.downloaded_ever != earlier.downloaded_ever {
                    events.push(LifecycleEvent::Progress(snapshot.clone()));
                }
                // Status is single-valued, so at most one transition fires
                // per torrent per poll.
                if snapshot.status != earlier.status {
                    events.push(LifecycleEvent::transition(snapshot.clone()));
                }
            }
        }
    }

    for earlier in previous.iter() {
        if !current.contains(&earlier.hash_string) {
            events.push(LifecycleEvent::Deleted(earlier.clone()));
        }
    }

    events
}
