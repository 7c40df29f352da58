//! WASM bindings for overlap-engine.
//!
//! Exposes overlap aggregation, the own-slot conflict check and overlay colour
//! grading to the JavaScript calendar UI via `wasm-bindgen`. All complex types
//! are passed as JSON strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p overlap-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir packages/overlap-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/overlap_engine_wasm.wasm
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use overlap_engine::render::daily_max_overlap;
use overlap_engine::{Interval, OverlapWindow, ParticipantAvailability};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

/// Input format for slots passed from JavaScript.
#[derive(Deserialize)]
struct SlotInput {
    start: String,
    end: String,
}

/// Input format for one participant passed from JavaScript.
#[derive(Deserialize)]
struct ParticipantInput {
    participant_id: String,
    display_name: String,
    #[serde(default)]
    intervals: Vec<SlotInput>,
}

#[derive(Serialize, Deserialize)]
struct WindowDto {
    start: String,
    end: String,
    duration_minutes: i64,
    participant_ids: Vec<String>,
    participant_names: Vec<String>,
    count: usize,
}

impl From<&OverlapWindow> for WindowDto {
    fn from(w: &OverlapWindow) -> Self {
        Self {
            start: w.interval.start().to_rfc3339(),
            end: w.interval.end().to_rfc3339(),
            duration_minutes: w.interval.duration_minutes(),
            participant_ids: w.participant_ids.iter().cloned().collect(),
            participant_names: w.participant_names.clone(),
            count: w.count,
        }
    }
}

#[derive(Serialize)]
struct DailyDto {
    date: String,
    count: usize,
}

// ---------------------------------------------------------------------------
// Helpers (plain `String` errors so they run outside a JS host)
// ---------------------------------------------------------------------------

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts both RFC 3339 (with timezone offset, e.g., "2026-03-16T09:00:00+09:00")
/// and naive local time (e.g., "2026-03-16T09:00:00"), which is interpreted as UTC.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| format!("Invalid datetime '{}': {}", s, e))
}

fn parse_slot(slot: &SlotInput) -> Result<Interval, String> {
    let start = parse_datetime(&slot.start)?;
    let end = parse_datetime(&slot.end)?;
    Interval::new(start, end).map_err(|e| e.to_string())
}

fn parse_slots_json(json: &str) -> Result<Vec<Interval>, String> {
    let inputs: Vec<SlotInput> =
        serde_json::from_str(json).map_err(|e| format!("Invalid slots JSON: {}", e))?;
    inputs.iter().map(parse_slot).collect()
}

fn parse_participants_json(json: &str) -> Result<Vec<ParticipantAvailability>, String> {
    let inputs: Vec<ParticipantInput> =
        serde_json::from_str(json).map_err(|e| format!("Invalid participants JSON: {}", e))?;

    inputs
        .into_iter()
        .map(|input| {
            let intervals = input
                .intervals
                .iter()
                .map(parse_slot)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ParticipantAvailability::new(
                input.participant_id,
                input.display_name,
                intervals,
            ))
        })
        .collect()
}

fn windows_to_json(windows: &[OverlapWindow]) -> Result<String, String> {
    let dtos: Vec<WindowDto> = windows.iter().map(WindowDto::from).collect();
    serde_json::to_string(&dtos).map_err(|e| format!("Serialization error: {}", e))
}

fn compute_overlaps_json(
    participants_json: &str,
    min_overlap_count: u32,
) -> Result<String, String> {
    let participants = parse_participants_json(participants_json)?;
    let windows = overlap_engine::compute_overlaps(&participants, min_overlap_count as usize)
        .map_err(|e| e.to_string())?;
    windows_to_json(&windows)
}

fn full_overlap_json(participants_json: &str) -> Result<String, String> {
    let participants = parse_participants_json(participants_json)?;
    windows_to_json(&overlap_engine::full_overlap_windows(&participants))
}

fn daily_max_json(windows_json: &str, timezone: &str) -> Result<String, String> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| format!("Invalid timezone: {}", timezone))?;
    let dtos: Vec<WindowDto> =
        serde_json::from_str(windows_json).map_err(|e| format!("Invalid windows JSON: {}", e))?;

    let windows = dtos
        .into_iter()
        .map(|dto| {
            let interval = parse_slot(&SlotInput {
                start: dto.start,
                end: dto.end,
            })?;
            Ok(OverlapWindow {
                interval,
                participant_ids: dto.participant_ids.into_iter().collect(),
                participant_names: dto.participant_names,
                count: dto.count,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    let daily: Vec<DailyDto> = daily_max_overlap(&windows, tz)
        .into_iter()
        .map(|(date, count)| DailyDto {
            date: date.to_string(),
            count,
        })
        .collect();
    serde_json::to_string(&daily).map_err(|e| format!("Serialization error: {}", e))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Compute overlap windows where at least `min_overlap_count` participants are
/// available.
///
/// `participants_json` must be a JSON array of
/// `{participant_id, display_name, intervals: [{start, end}]}` objects with ISO
/// 8601 datetime strings. Returns a JSON array of
/// `{start, end, duration_minutes, participant_ids, participant_names, count}`.
#[wasm_bindgen(js_name = "computeOverlaps")]
pub fn compute_overlaps(
    participants_json: &str,
    min_overlap_count: u32,
) -> Result<String, JsValue> {
    compute_overlaps_json(participants_json, min_overlap_count).map_err(|e| JsValue::from_str(&e))
}

/// Windows where every participant (including those with no slots) is available.
#[wasm_bindgen(js_name = "fullOverlapWindows")]
pub fn full_overlap_windows(participants_json: &str) -> Result<String, JsValue> {
    full_overlap_json(participants_json).map_err(|e| JsValue::from_str(&e))
}

/// Check whether a candidate slot overlaps any of `slots_json` except the one at
/// `exclude_index`. Touching slots do not conflict.
#[wasm_bindgen(js_name = "hasTimeConflict")]
pub fn has_time_conflict(
    start: &str,
    end: &str,
    slots_json: &str,
    exclude_index: Option<u32>,
) -> Result<bool, JsValue> {
    let start = parse_datetime(start).map_err(|e| JsValue::from_str(&e))?;
    let end = parse_datetime(end).map_err(|e| JsValue::from_str(&e))?;
    let slots = parse_slots_json(slots_json).map_err(|e| JsValue::from_str(&e))?;
    Ok(overlap_engine::has_time_conflict(
        start,
        end,
        &slots,
        exclude_index.map(|i| i as usize),
    ))
}

/// Overlay colour (`rgb(r, g, b)`) for a window of `count` out of `total`.
#[wasm_bindgen(js_name = "overlapColor")]
pub fn overlap_color(count: u32, total: u32) -> String {
    overlap_engine::overlap_color(count as usize, total as usize).to_string()
}

/// Maximum overlap count per day in `timezone`.
///
/// `windows_json` is the output of `computeOverlaps`. Returns a JSON array of
/// `{date, count}` sorted by date.
#[wasm_bindgen(js_name = "dailyMaxOverlap")]
pub fn daily_max_overlap_js(windows_json: &str, timezone: &str) -> Result<String, JsValue> {
    daily_max_json(windows_json, timezone).map_err(|e| JsValue::from_str(&e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARTICIPANTS: &str = r#"[
        {"participant_id":"a","display_name":"Alice","intervals":[
            {"start":"2026-03-16T09:00:00Z","end":"2026-03-16T10:00:00Z"}]},
        {"participant_id":"b","display_name":"Bob","intervals":[
            {"start":"2026-03-16T09:30:00","end":"2026-03-16T10:30:00"}]}
    ]"#;

    #[test]
    fn computes_windows_as_json() {
        let json = compute_overlaps_json(PARTICIPANTS, 2).unwrap();
        let windows: Vec<WindowDto> = serde_json::from_str(&json).unwrap();

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].duration_minutes, 30);
        assert_eq!(windows[0].participant_names, vec!["Alice", "Bob"]);
    }

    #[test]
    fn zero_threshold_is_an_error() {
        assert!(compute_overlaps_json(PARTICIPANTS, 0).is_err());
    }

    #[test]
    fn inverted_slot_is_an_error() {
        let json = r#"[{"participant_id":"a","display_name":"A","intervals":[
            {"start":"2026-03-16T10:00:00Z","end":"2026-03-16T09:00:00Z"}]}]"#;
        assert!(compute_overlaps_json(json, 1).is_err());
    }

    #[test]
    fn daily_summary_from_window_json() {
        let windows = compute_overlaps_json(PARTICIPANTS, 1).unwrap();
        let daily = daily_max_json(&windows, "Asia/Seoul").unwrap();
        assert_eq!(daily, r#"[{"date":"2026-03-16","count":2}]"#);
    }

    #[test]
    fn colour_is_css_rgb() {
        assert_eq!(overlap_color(1, 1), "rgb(255, 243, 176)");
    }
}
