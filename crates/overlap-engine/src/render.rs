//! Presentation helpers for calendar overlays.
//!
//! Colour-grades overlap windows by how many participants they include and
//! summarises the busiest overlap per calendar day.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::overlap::OverlapWindow;

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Colour for the smallest overlap (pale yellow).
pub const MIN_OVERLAP_COLOR: Rgb = Rgb::new(0xFF, 0xF3, 0xB0);

/// Colour for an overlap including everyone (deep green).
pub const FULL_OVERLAP_COLOR: Rgb = Rgb::new(0x2E, 0x7D, 0x32);

/// Per-participant colours for raw slots, cycled by participant index.
pub const PARTICIPANT_PALETTE: [Rgb; 8] = [
    Rgb::new(0x4A, 0x90, 0xE2),
    Rgb::new(0x7B, 0x68, 0xEE),
    Rgb::new(0x20, 0xB2, 0xAA),
    Rgb::new(0xFF, 0x6B, 0x6B),
    Rgb::new(0xF3, 0x9C, 0x12),
    Rgb::new(0x27, 0xAE, 0x60),
    Rgb::new(0xE9, 0x1E, 0x63),
    Rgb::new(0x9C, 0x27, 0xB0),
];

/// Colour for a window of `count` participants out of `total`.
///
/// Interpolates linearly from [`MIN_OVERLAP_COLOR`] at one participant to
/// [`FULL_OVERLAP_COLOR`] at `total`. With `total <= 1` there is nothing to grade
/// and the minimum colour is returned.
pub fn overlap_color(count: usize, total: usize) -> Rgb {
    if total <= 1 {
        return MIN_OVERLAP_COLOR;
    }
    let ratio = (count.saturating_sub(1) as f64 / (total - 1) as f64).min(1.0);
    let channel = |from: u8, to: u8| -> u8 {
        (from as f64 - ratio * (from as f64 - to as f64)).round() as u8
    };
    Rgb::new(
        channel(MIN_OVERLAP_COLOR.r, FULL_OVERLAP_COLOR.r),
        channel(MIN_OVERLAP_COLOR.g, FULL_OVERLAP_COLOR.g),
        channel(MIN_OVERLAP_COLOR.b, FULL_OVERLAP_COLOR.b),
    )
}

/// Colour for the participant at `index` in display order.
pub fn participant_color(index: usize) -> Rgb {
    PARTICIPANT_PALETTE[index % PARTICIPANT_PALETTE.len()]
}

/// Maximum overlap count per day, keyed by each window's start date in `tz`.
pub fn daily_max_overlap(windows: &[OverlapWindow], tz: Tz) -> BTreeMap<NaiveDate, usize> {
    let mut daily: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for window in windows {
        let day = window.interval.start().with_timezone(&tz).date_naive();
        let best = daily.entry(day).or_insert(0);
        *best = (*best).max(window.count);
    }
    daily
}
