//! Half-open time intervals `[start, end)`.
//!
//! An [`Interval`] can only be built through [`Interval::new`] (or
//! [`Interval::from_millis`]), both of which reject `start >= end`. JSON input is
//! routed through the same check, so every interval the aggregator sees is
//! well-formed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OverlapError, Result};

/// A half-open time range `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Unchecked wire shape of an [`Interval`].
#[derive(Deserialize)]
struct RawInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawInterval> for Interval {
    type Error = OverlapError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        Interval::new(raw.start, raw.end)
    }
}

impl Interval {
    /// Build an interval, rejecting zero-length and inverted ranges.
    ///
    /// # Errors
    /// Returns `OverlapError::InvalidInterval` if `start >= end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(OverlapError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build an interval from epoch milliseconds, the shape persisted records use.
    ///
    /// # Errors
    /// Returns `OverlapError::InvalidTimestamp` if either value is out of chrono's
    /// range, or `OverlapError::InvalidInterval` if `start_ms >= end_ms`.
    pub fn from_millis(start_ms: i64, end_ms: i64) -> Result<Self> {
        let start = DateTime::from_timestamp_millis(start_ms)
            .ok_or(OverlapError::InvalidTimestamp(start_ms))?;
        let end = DateTime::from_timestamp_millis(end_ms)
            .ok_or(OverlapError::InvalidTimestamp(end_ms))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// True when `t` lies in `[start, end)`.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// True when the two intervals share at least one instant.
    ///
    /// Touching intervals (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The smallest interval covering both `self` and `other`.
    pub fn span(&self, other: &Interval) -> Interval {
        Interval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}
