//! Availability filter -- drop candidate slots that collide with busy time.
//!
//! Each candidate holds `[slot, slot + HOLD_MINUTES)`. Busy intervals are
//! half-open as well, so a hold that ends exactly when a busy interval starts
//! (or starts exactly when one ends) is NOT a collision. Busy intervals may
//! overlap each other, repeat, or arrive unordered.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Length of the hold each proposed slot occupies (and of exported events).
pub const HOLD_MINUTES: i64 = 30;

/// A `[start, end)` span during which no slot may be proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// A candidate slot that collides with a busy interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotConflict {
    pub slot: DateTime<Utc>,
    pub busy: BusyInterval,
    pub overlap_minutes: i64,
}

/// Half-open overlap test: `a_start < b_end && b_start < a_end`.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// End of the hold that starts at `slot`.
pub fn hold_end(slot: DateTime<Utc>) -> DateTime<Utc> {
    slot + Duration::minutes(HOLD_MINUTES)
}

/// Keep the candidates whose hold overlaps no busy interval.
///
/// With no busy intervals the input is returned unchanged.
pub fn filter_available(
    candidates: &[DateTime<Utc>],
    busy: &[BusyInterval],
) -> Vec<DateTime<Utc>> {
    if busy.is_empty() {
        return candidates.to_vec();
    }

    candidates
        .iter()
        .copied()
        .filter(|slot| {
            let end = hold_end(*slot);
            !busy.iter().any(|b| overlaps(*slot, end, b.start, b.end))
        })
        .collect()
}

/// Every (candidate, busy interval) pair that collides, with the overlap length.
///
/// A candidate that hits several busy intervals appears once per interval.
pub fn find_conflicts(candidates: &[DateTime<Utc>], busy: &[BusyInterval]) -> Vec<SlotConflict> {
    let mut conflicts = Vec::new();

    for slot in candidates {
        let end = hold_end(*slot);
        for b in busy {
            if overlaps(*slot, end, b.start, b.end) {
                let overlap_start = (*slot).max(b.start);
                let overlap_end = end.min(b.end);
                conflicts.push(SlotConflict {
                    slot: *slot,
                    busy: *b,
                    overlap_minutes: (overlap_end - overlap_start).num_minutes(),
                });
            }
        }
    }

    conflicts
}

/// The span a busy-source query must cover for `slots`: from the earliest
/// slot to the end of the latest hold. `None` for an empty list.
pub fn query_range(slots: &[DateTime<Utc>]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = slots.iter().min()?;
    let last = slots.iter().max()?;
    Some((*first, hold_end(*last)))
}
