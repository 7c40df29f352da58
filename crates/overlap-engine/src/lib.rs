//! # overlap-engine
//!
//! Deterministic availability overlap aggregation for group scheduling.
//!
//! Participants each submit a set of time intervals; the engine finds every
//! window where enough of them are available at once, annotated with who is
//! available, using a single sweep over sorted start/end events. Touching
//! intervals never count as overlapping.
//!
//! ## Modules
//!
//! - [`overlap`]: Sweep-line aggregation into merged overlap windows
//! - [`interval`]: Validated half-open `[start, end)` intervals
//! - [`conflict`]: Check a candidate slot against a participant's own slots
//! - [`ingest`]: Persisted slot records → typed availability
//! - [`names`]: Batched display-name resolution with placeholder fallback
//! - [`plan`]: Plan-level service over injected store/directory/session collaborators
//! - [`render`]: Overlap colour grading and per-day summaries
//! - [`error`]: Error types

pub mod conflict;
pub mod error;
pub mod ingest;
pub mod interval;
pub mod names;
pub mod overlap;
pub mod plan;
pub mod render;

pub use conflict::has_time_conflict;
pub use error::OverlapError;
pub use interval::Interval;
pub use overlap::{
    compute_overlaps, full_overlap_windows, merge_adjacent, parse_participants_json,
    OverlapWindow, ParticipantAvailability,
};
pub use render::overlap_color;
