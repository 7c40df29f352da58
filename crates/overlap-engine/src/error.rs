//! Error types for overlap-engine operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlapError {
    #[error("Invalid interval: start {start} is not before end {end}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Invalid timestamp: {0} ms is out of range")]
    InvalidTimestamp(i64),

    #[error("Invalid overlap threshold: {0} (must be at least 1)")]
    InvalidThreshold(usize),

    #[error("Display-name lookup requires at least one participant id")]
    EmptyBatch,

    #[error("Display-name lookup of {requested} ids exceeds the limit of {max}")]
    BatchTooLarge { requested: usize, max: usize },

    #[error("Display-name lookup failed: {0}")]
    Lookup(String),

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Time slot {start} - {end} overlaps an existing slot")]
    TimeConflict {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Participant {participant_id} cannot be edited by the current user")]
    PermissionDenied { participant_id: String },

    #[error("Slot index {index} is out of range ({len} slots)")]
    SlotIndexOutOfRange { index: usize, len: usize },

    #[error("No user is signed in")]
    NotSignedIn,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OverlapError>;
