//! Tests for the overlap sweep and the adjacent-window merge.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeZone, Utc};
use overlap_engine::{
    compute_overlaps, full_overlap_windows, merge_adjacent, parse_participants_json, Interval,
    OverlapError, OverlapWindow, ParticipantAvailability,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, hour, min, 0).unwrap()
}

fn iv(start: (u32, u32), end: (u32, u32)) -> Interval {
    Interval::new(at(start.0, start.1), at(end.0, end.1)).unwrap()
}

fn person(id: &str, intervals: Vec<Interval>) -> ParticipantAvailability {
    ParticipantAvailability::new(id, id.to_uppercase(), intervals)
}

fn ids(window: &OverlapWindow) -> Vec<&str> {
    window.participant_ids.iter().map(String::as_str).collect()
}

// ── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn partial_overlap_of_two_participants() {
    let input = vec![
        person("a", vec![iv((9, 0), (10, 0))]),
        person("b", vec![iv((9, 30), (10, 30))]),
    ];

    let windows = compute_overlaps(&input, 2).unwrap();

    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].interval, iv((9, 30), (10, 0)));
    assert_eq!(windows[0].count, 2);
    assert_eq!(ids(&windows[0]), vec!["a", "b"]);
    assert_eq!(windows[0].participant_names, vec!["A", "B"]);
}

#[test]
fn touching_intervals_produce_no_window() {
    let input = vec![
        person("a", vec![iv((9, 0), (10, 0))]),
        person("b", vec![iv((10, 0), (11, 0))]),
    ];

    let windows = compute_overlaps(&input, 2).unwrap();

    assert!(windows.is_empty(), "boundary touch is not an overlap");
}

#[test]
fn membership_change_keeps_windows_separate() {
    let input = vec![
        person("a", vec![iv((9, 0), (13, 0))]),
        person("b", vec![iv((9, 0), (13, 0))]),
        person("c", vec![iv((9, 0), (12, 0))]),
    ];

    let windows = compute_overlaps(&input, 2).unwrap();

    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0].interval, iv((9, 0), (12, 0)));
    assert_eq!(windows[0].count, 3);
    assert_eq!(windows[1].interval, iv((12, 0), (13, 0)));
    assert_eq!(windows[1].count, 2);
    assert_eq!(ids(&windows[1]), vec!["a", "b"]);
}

#[test]
fn same_membership_across_split_is_merged() {
    // c's availability is split at 12:00, which splits the sweep but not the
    // membership.
    let input = vec![
        person("a", vec![iv((9, 0), (13, 0))]),
        person("b", vec![iv((9, 0), (13, 0))]),
        person("c", vec![iv((9, 0), (12, 0)), iv((12, 0), (13, 0))]),
    ];

    let windows = compute_overlaps(&input, 2).unwrap();

    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].interval, iv((9, 0), (13, 0)));
    assert_eq!(windows[0].count, 3);
}

#[test]
fn empty_input_yields_nothing() {
    assert!(compute_overlaps(&[], 1).unwrap().is_empty());
    assert!(compute_overlaps(&[], 5).unwrap().is_empty());
}

#[test]
fn single_participant_threshold_one() {
    let input = vec![person("a", vec![iv((9, 0), (10, 0))])];

    let windows = compute_overlaps(&input, 1).unwrap();

    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].interval, iv((9, 0), (10, 0)));
    assert_eq!(windows[0].count, 1);
}

// ── Edge cases ──────────────────────────────────────────────────────────────

#[test]
fn zero_threshold_is_rejected() {
    let input = vec![person("a", vec![iv((9, 0), (10, 0))])];
    assert!(matches!(
        compute_overlaps(&input, 0),
        Err(OverlapError::InvalidThreshold(0))
    ));
}

#[test]
fn threshold_above_participant_count_is_empty() {
    let input = vec![
        person("a", vec![iv((9, 0), (10, 0))]),
        person("b", vec![iv((9, 0), (10, 0))]),
    ];
    assert!(compute_overlaps(&input, 3).unwrap().is_empty());
}

#[test]
fn participant_without_intervals_never_appears() {
    let input = vec![
        person("a", vec![iv((9, 0), (10, 0))]),
        person("b", vec![iv((9, 0), (10, 0))]),
        person("ghost", vec![]),
    ];

    let windows = compute_overlaps(&input, 2).unwrap();

    assert_eq!(windows.len(), 1);
    assert!(!windows[0].participant_ids.contains("ghost"));
}

#[test]
fn identical_intervals_overlap_throughout() {
    let input = vec![
        person("a", vec![iv((9, 0), (10, 0))]),
        person("b", vec![iv((9, 0), (10, 0))]),
    ];

    let windows = compute_overlaps(&input, 2).unwrap();

    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].interval, iv((9, 0), (10, 0)));
}

#[test]
fn self_overlapping_intervals_count_once() {
    // a submitted 09:00-12:00 and 10:00-11:00; b is free 10:30-11:30.
    let input = vec![
        person("a", vec![iv((9, 0), (12, 0)), iv((10, 0), (11, 0))]),
        person("b", vec![iv((10, 30), (11, 30))]),
    ];

    let windows = compute_overlaps(&input, 2).unwrap();

    // a stays active after the inner interval closes at 11:00.
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].interval, iv((10, 30), (11, 30)));
    assert_eq!(windows[0].count, 2);
}

#[test]
fn gap_between_windows_is_not_merged() {
    let input = vec![
        person("a", vec![iv((9, 0), (10, 0)), iv((11, 0), (12, 0))]),
        person("b", vec![iv((9, 0), (12, 0))]),
    ];

    let windows = compute_overlaps(&input, 2).unwrap();

    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0].interval, iv((9, 0), (10, 0)));
    assert_eq!(windows[1].interval, iv((11, 0), (12, 0)));
}

#[test]
fn windows_are_time_ordered_and_meet_threshold() {
    let input = vec![
        person("a", vec![iv((8, 0), (9, 0)), iv((14, 0), (16, 0))]),
        person("b", vec![iv((8, 30), (15, 0))]),
        person("c", vec![iv((8, 45), (14, 30))]),
    ];

    let windows = compute_overlaps(&input, 2).unwrap();

    assert!(!windows.is_empty());
    for pair in windows.windows(2) {
        assert!(pair[0].interval.end() <= pair[1].interval.start());
    }
    for window in &windows {
        assert!(window.count >= 2);
        assert_eq!(window.count, window.participant_ids.len());
        assert_eq!(window.count, window.participant_names.len());
    }
}

// ── Full overlap ────────────────────────────────────────────────────────────

#[test]
fn full_overlap_requires_everyone() {
    let input = vec![
        person("a", vec![iv((9, 0), (12, 0))]),
        person("b", vec![iv((10, 0), (13, 0))]),
        person("c", vec![iv((11, 0), (14, 0))]),
    ];

    let windows = full_overlap_windows(&input);

    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].interval, iv((11, 0), (12, 0)));
    assert_eq!(windows[0].count, 3);
}

#[test]
fn full_overlap_counts_participants_without_slots() {
    let input = vec![
        person("a", vec![iv((9, 0), (12, 0))]),
        person("b", vec![iv((9, 0), (12, 0))]),
        person("silent", vec![]),
    ];

    assert!(full_overlap_windows(&input).is_empty());
}

#[test]
fn full_overlap_of_nobody_is_empty() {
    assert!(full_overlap_windows(&[]).is_empty());
}

// ── Merge pass ──────────────────────────────────────────────────────────────

fn window(interval: Interval, members: &[&str]) -> OverlapWindow {
    let participant_ids: BTreeSet<String> = members.iter().map(|m| m.to_string()).collect();
    OverlapWindow {
        interval,
        participant_names: participant_ids.iter().map(|m| m.to_uppercase()).collect(),
        count: participant_ids.len(),
        participant_ids,
    }
}

#[test]
fn merge_joins_touching_windows_with_same_members() {
    let merged = merge_adjacent(vec![
        window(iv((9, 0), (10, 0)), &["a", "b"]),
        window(iv((10, 0), (11, 0)), &["b", "a"]),
        window(iv((11, 0), (12, 0)), &["a", "b"]),
    ]);

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].interval, iv((9, 0), (12, 0)));
}

#[test]
fn merge_keeps_different_members_apart() {
    let merged = merge_adjacent(vec![
        window(iv((9, 0), (10, 0)), &["a", "b"]),
        window(iv((10, 0), (11, 0)), &["a", "c"]),
    ]);

    assert_eq!(merged.len(), 2);
}

#[test]
fn merge_of_nothing_is_nothing() {
    assert!(merge_adjacent(Vec::new()).is_empty());
}

// ── JSON input ──────────────────────────────────────────────────────────────

#[test]
fn parses_participants_from_json() {
    let json = r#"[
        {"participant_id":"a","display_name":"Alice","intervals":[
            {"start":"2026-03-16T09:00:00Z","end":"2026-03-16T10:00:00Z"}]},
        {"participant_id":"b","display_name":"Bob","intervals":[
            {"start":"2026-03-16T09:30:00Z","end":"2026-03-16T10:30:00Z"}]},
        {"participant_id":"c","display_name":"Cleo"}
    ]"#;

    let input = parse_participants_json(json).unwrap();
    assert_eq!(input.len(), 3);
    assert!(input[2].intervals.is_empty());

    let windows = compute_overlaps(&input, 2).unwrap();
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0].participant_names, vec!["Alice", "Bob"]);
}

#[test]
fn json_with_inverted_interval_is_rejected() {
    let json = r#"[{"participant_id":"a","display_name":"Alice","intervals":[
        {"start":"2026-03-16T10:00:00Z","end":"2026-03-16T10:00:00Z"}]}]"#;

    assert!(matches!(
        parse_participants_json(json),
        Err(OverlapError::Json(_))
    ));
}
