//! Tests for the own-slot conflict check.

use chrono::{DateTime, TimeZone, Utc};
use overlap_engine::{has_time_conflict, Interval};

/// Helper to create a time on 2026-03-01.
fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, hour, min, 0).unwrap()
}

/// Helper to create a slot from hour/minute pairs on 2026-03-01.
fn slot(start_hour: u32, start_min: u32, end_hour: u32, end_min: u32) -> Interval {
    Interval::new(at(start_hour, start_min), at(end_hour, end_min)).unwrap()
}

#[test]
fn overlapping_candidate_detected() {
    // Existing: 09:00-10:00, candidate: 09:30-10:30
    let existing = vec![slot(9, 0, 10, 0)];

    assert!(has_time_conflict(at(9, 30), at(10, 30), &existing, None));
}

#[test]
fn disjoint_candidate_no_conflict() {
    let existing = vec![slot(9, 0, 10, 0)];

    assert!(!has_time_conflict(at(11, 0), at(12, 0), &existing, None));
}

#[test]
fn adjacent_candidate_not_a_conflict() {
    // Touching on either side is allowed.
    let existing = vec![slot(9, 0, 10, 0)];

    assert!(
        !has_time_conflict(at(10, 0), at(11, 0), &existing, None),
        "candidate starting at existing end should not conflict"
    );
    assert!(
        !has_time_conflict(at(8, 0), at(9, 0), &existing, None),
        "candidate ending at existing start should not conflict"
    );
}

#[test]
fn contained_candidate_conflicts() {
    let existing = vec![slot(9, 0, 12, 0)];

    assert!(has_time_conflict(at(10, 0), at(11, 0), &existing, None));
}

#[test]
fn enclosing_candidate_conflicts() {
    let existing = vec![slot(10, 0, 11, 0)];

    assert!(has_time_conflict(at(9, 0), at(12, 0), &existing, None));
}

#[test]
fn excluded_slot_is_ignored() {
    // Moving slot 0 onto part of its own range is fine.
    let existing = vec![slot(9, 0, 10, 0), slot(14, 0, 15, 0)];

    assert!(!has_time_conflict(at(9, 30), at(10, 30), &existing, Some(0)));
}

#[test]
fn exclusion_does_not_hide_other_slots() {
    let existing = vec![slot(9, 0, 10, 0), slot(14, 0, 15, 0)];

    assert!(has_time_conflict(at(13, 30), at(14, 30), &existing, Some(0)));
}

#[test]
fn out_of_range_exclusion_checks_everything() {
    let existing = vec![slot(9, 0, 10, 0)];

    assert!(has_time_conflict(at(9, 30), at(10, 30), &existing, Some(7)));
}

#[test]
fn empty_slot_list_no_conflict() {
    assert!(!has_time_conflict(at(9, 0), at(10, 0), &[], None));
}
