//! Detect whether a candidate slot collides with a participant's existing slots.
//!
//! Used before adding, moving or resizing one of the signed-in user's own slots.
//! Adjacent slots (where one ends exactly when another starts) are NOT conflicts,
//! matching the tie-break of the overlap sweep.

use chrono::{DateTime, Utc};

use crate::interval::Interval;

/// Return true if `[start, end)` overlaps any slot in `existing`.
///
/// A slot overlaps when `start < slot.end && end > slot.start`. The slot at
/// `exclude_index`, if any, is skipped so a slot can be moved onto part of its
/// own previous range.
pub fn has_time_conflict(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    existing: &[Interval],
    exclude_index: Option<usize>,
) -> bool {
    existing
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != exclude_index)
        .any(|(_, slot)| start < slot.end() && end > slot.start())
}
