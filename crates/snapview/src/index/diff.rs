//! Baseline reconciliation between a freshly loaded suite and its
//! previously indexed version.
//!
//! Dirty tracking is baseline-anchored: once a snapshot has a baseline,
//! every later load is compared against that baseline (the last accepted
//! state), not against the immediately prior load. Consecutive edits
//! therefore keep diffing against one fixed reference point until the
//! baseline is explicitly accepted.

use crate::types::{Baseline, SnapshotSuite};

/// Reconciles `next` (a freshly loaded suite, all flags clean) against the
/// previously indexed suite for the same path, if any.
pub(crate) fn reconcile(next: &mut SnapshotSuite, previous: Option<&SnapshotSuite>) {
    let Some(previous) = previous else {
        // First load of this suite: nothing to diff against.
        return;
    };

    for (id, snapshot) in next.snapshots.iter_mut() {
        let Some(prev) = previous.snapshots.get(id) else {
            // Newly added snapshot: clean, no baseline.
            continue;
        };
        if let Some(baseline) = &prev.baseline {
            if snapshot.snap == baseline.snap && snapshot.html == baseline.html {
                // Content returned to the accepted state.
                snapshot.dirty = false;
                snapshot.baseline = None;
            } else {
                snapshot.dirty = true;
                snapshot.baseline = Some(baseline.clone());
            }
        } else if snapshot.snap != prev.snap || snapshot.html != prev.html {
            snapshot.dirty = true;
            snapshot.baseline = Some(Baseline {
                snap: prev.snap.clone(),
                html: prev.html.clone(),
            });
        }
    }

    // Snapshots that vanished from the new parse are retained as deleted so
    // the removal stays visible.
    for (id, prev) in &previous.snapshots {
        if next.snapshots.contains_key(id) {
            continue;
        }
        let mut carried = prev.clone();
        carried.deleted = true;
        carried.dirty = true;
        next.snapshots.insert(id.clone(), carried);
    }

    next.dirty = next.snapshots.values().any(|snapshot| snapshot.dirty);
}
