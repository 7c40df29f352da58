//! Sweep-line aggregation of participant availability into overlap windows.
//!
//! Every participant's intervals are flattened into start/end events, swept in
//! time order while tracking who is currently available, and each stretch
//! between consecutive event times is emitted when enough participants are
//! active. A final pass merges windows that touch and have identical membership.
//!
//! This module is the single home of the overlap algorithm: members, legacy
//! availability documents and plan time slots all go through
//! [`compute_overlaps`] after ingestion.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OverlapError, Result};
use crate::interval::Interval;

/// One participant's submitted availability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantAvailability {
    /// Unique within one input set (the user id).
    pub participant_id: String,
    pub display_name: String,
    /// Assumed disjoint; order does not matter.
    #[serde(default)]
    pub intervals: Vec<Interval>,
}

impl ParticipantAvailability {
    pub fn new(
        participant_id: impl Into<String>,
        display_name: impl Into<String>,
        intervals: Vec<Interval>,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            display_name: display_name.into(),
            intervals,
        }
    }
}

/// A time range during which a fixed set of participants is available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapWindow {
    pub interval: Interval,
    pub participant_ids: BTreeSet<String>,
    /// Display names in the same order as `participant_ids`.
    pub participant_names: Vec<String>,
    /// Always equal to `participant_ids.len()`.
    pub count: usize,
}

/// Parse a JSON array of participants into typed availability.
///
/// # Errors
/// Returns `OverlapError::Json` when the document is malformed or any interval
/// has `start >= end`.
pub fn parse_participants_json(json: &str) -> Result<Vec<ParticipantAvailability>> {
    Ok(serde_json::from_str(json)?)
}

// Ends sort before starts so touching intervals never count as overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    End,
    Start,
}

struct SweepEvent<'a> {
    time: DateTime<Utc>,
    kind: EventKind,
    participant: &'a ParticipantAvailability,
}

/// Participants whose interval contains the sweep position, keyed by id.
///
/// The depth counts how many of the participant's own intervals are open, so
/// self-overlapping input keeps them active until the last one closes while
/// still counting them once.
#[derive(Default)]
struct ActiveSet<'a> {
    members: BTreeMap<&'a str, (&'a str, usize)>,
}

impl<'a> ActiveSet<'a> {
    fn len(&self) -> usize {
        self.members.len()
    }

    fn apply(&mut self, event: &SweepEvent<'a>) {
        let id = event.participant.participant_id.as_str();
        match event.kind {
            EventKind::Start => {
                let entry = self
                    .members
                    .entry(id)
                    .or_insert((event.participant.display_name.as_str(), 0));
                entry.1 += 1;
            }
            EventKind::End => {
                if let Some(entry) = self.members.get_mut(id) {
                    entry.1 -= 1;
                    if entry.1 == 0 {
                        self.members.remove(id);
                    }
                }
            }
        }
    }

    fn snapshot(&self, interval: Interval) -> OverlapWindow {
        OverlapWindow {
            interval,
            participant_ids: self.members.keys().map(|id| id.to_string()).collect(),
            participant_names: self
                .members
                .values()
                .map(|(name, _)| name.to_string())
                .collect(),
            count: self.members.len(),
        }
    }
}

/// Compute every window where at least `min_overlap_count` participants are
/// available at once.
///
/// Windows are split wherever the active participant set changes, then windows
/// that share an exact boundary and an identical participant set are merged.
/// The result is sorted by start time.
///
/// # Errors
/// Returns `OverlapError::InvalidThreshold` if `min_overlap_count` is 0. Any
/// other input, including an empty slice, succeeds.
pub fn compute_overlaps(
    availabilities: &[ParticipantAvailability],
    min_overlap_count: usize,
) -> Result<Vec<OverlapWindow>> {
    if min_overlap_count == 0 {
        return Err(OverlapError::InvalidThreshold(min_overlap_count));
    }
    // Not enough participants to ever reach the threshold.
    if availabilities.len() < min_overlap_count {
        return Ok(Vec::new());
    }

    let mut events: Vec<SweepEvent<'_>> = availabilities
        .iter()
        .flat_map(|participant| {
            participant.intervals.iter().flat_map(move |interval| {
                [
                    SweepEvent {
                        time: interval.start(),
                        kind: EventKind::Start,
                        participant,
                    },
                    SweepEvent {
                        time: interval.end(),
                        kind: EventKind::End,
                        participant,
                    },
                ]
            })
        })
        .collect();

    if events.is_empty() {
        return Ok(Vec::new());
    }

    // The participant id makes the order total, so the output never depends on
    // input order.
    events.sort_by(|a, b| {
        (a.time, a.kind, a.participant.participant_id.as_str()).cmp(&(
            b.time,
            b.kind,
            b.participant.participant_id.as_str(),
        ))
    });

    let mut windows = Vec::new();
    let mut active = ActiveSet::default();
    let mut last_time: Option<DateTime<Utc>> = None;

    for event in &events {
        if let Some(last) = last_time {
            if event.time > last && active.len() >= min_overlap_count {
                windows.push(active.snapshot(Interval::new(last, event.time)?));
            }
        }
        active.apply(event);
        last_time = Some(event.time);
    }

    tracing::debug!(
        participants = availabilities.len(),
        events = events.len(),
        raw_windows = windows.len(),
        "overlap sweep finished"
    );

    Ok(merge_adjacent(windows))
}

/// Windows where every participant in `availabilities` is available.
///
/// Participants with no intervals still count toward the total, so a single
/// empty participant makes the result empty.
pub fn full_overlap_windows(availabilities: &[ParticipantAvailability]) -> Vec<OverlapWindow> {
    if availabilities.is_empty() {
        return Vec::new();
    }
    // A non-zero threshold cannot fail.
    compute_overlaps(availabilities, availabilities.len()).unwrap_or_default()
}

/// Merge consecutive windows that touch and have the same participant set.
///
/// Windows separated by a gap, or whose membership differs, are left as is.
/// Running this on its own output changes nothing.
pub fn merge_adjacent(windows: Vec<OverlapWindow>) -> Vec<OverlapWindow> {
    let mut merged: Vec<OverlapWindow> = Vec::with_capacity(windows.len());

    for window in windows {
        if let Some(current) = merged.last_mut() {
            if current.interval.end() == window.interval.start()
                && current.participant_ids == window.participant_ids
            {
                current.interval = current.interval.span(&window.interval);
                continue;
            }
        }
        merged.push(window);
    }

    merged
}
