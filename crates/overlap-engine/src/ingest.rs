//! Conversion from persisted time-slot records to typed availability.
//!
//! Records are stored one per participant under a plan, keyed by the
//! participant's user id, with slot bounds as epoch milliseconds. This is the
//! only place raw bounds are validated; everything downstream works on
//! [`Interval`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::interval::Interval;
use crate::overlap::ParticipantAvailability;

/// A persisted slot, bounds in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl From<&Interval> for SlotRecord {
    fn from(interval: &Interval) -> Self {
        Self {
            start_ms: interval.start().timestamp_millis(),
            end_ms: interval.end().timestamp_millis(),
        }
    }
}

/// All slots one participant submitted for a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotsRecord {
    pub participant_id: String,
    #[serde(default)]
    pub slots: Vec<SlotRecord>,
}

/// What to do with a persisted slot whose start is not before its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestPolicy {
    /// Fail the whole ingestion on the first malformed slot.
    #[default]
    Strict,
    /// Drop malformed slots and keep going.
    SkipInvalid,
}

/// Convert one record's slots to intervals under `policy`.
///
/// # Errors
/// Under `IngestPolicy::Strict`, the first malformed slot's error.
pub fn record_intervals(record: &TimeSlotsRecord, policy: IngestPolicy) -> Result<Vec<Interval>> {
    let mut intervals = Vec::with_capacity(record.slots.len());
    for slot in &record.slots {
        match Interval::from_millis(slot.start_ms, slot.end_ms) {
            Ok(interval) => intervals.push(interval),
            Err(err) if policy == IngestPolicy::SkipInvalid => {
                tracing::warn!(
                    participant = %record.participant_id,
                    start_ms = slot.start_ms,
                    end_ms = slot.end_ms,
                    error = %err,
                    "skipping malformed slot"
                );
            }
            Err(err) => return Err(err),
        }
    }
    Ok(intervals)
}

/// Build typed availability from persisted records and resolved names.
///
/// Participants missing from `names` get `placeholder`. Record order is kept.
///
/// # Errors
/// Under `IngestPolicy::Strict`, fails on the first malformed slot.
pub fn ingest(
    records: &[TimeSlotsRecord],
    names: &HashMap<String, String>,
    placeholder: &str,
    policy: IngestPolicy,
) -> Result<Vec<ParticipantAvailability>> {
    records
        .iter()
        .map(|record| {
            let display_name = names
                .get(&record.participant_id)
                .map(String::as_str)
                .unwrap_or(placeholder);
            Ok(ParticipantAvailability::new(
                record.participant_id.clone(),
                display_name,
                record_intervals(record, policy)?,
            ))
        })
        .collect()
}

/// Convert intervals back into persistable slot records.
pub fn to_slot_records(intervals: &[Interval]) -> Vec<SlotRecord> {
    intervals.iter().map(SlotRecord::from).collect()
}
