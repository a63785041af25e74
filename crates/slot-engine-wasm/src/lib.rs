//! WASM bindings for slot-engine.
//!
//! Exposes slot generation, availability filtering, iCalendar import/export
//! and text rendering to a browser page via `wasm-bindgen`. All complex types
//! are passed as JSON strings. The engine is built without its async
//! `sources` feature: the page performs calendar queries itself and hands
//! the busy intervals over as JSON.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/pkg/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use slot_engine::availability::BusyInterval;
use slot_engine::config::{self, SlotConfigInput};
use slot_engine::render::{self, Tone};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GenerationDto {
    slots: Vec<String>,
    requested: usize,
    attempts: u32,
    exhausted: bool,
}

#[derive(Serialize)]
struct DaySummaryDto {
    day: String,
    count: usize,
}

#[derive(Serialize)]
struct BusyDto {
    start: String,
    end: String,
}

impl From<&BusyInterval> for BusyDto {
    fn from(b: &BusyInterval) -> Self {
        Self {
            start: b.start.to_rfc3339(),
            end: b.end.to_rfc3339(),
        }
    }
}

/// Input format for busy intervals passed from JavaScript.
#[derive(Deserialize)]
struct BusyInput {
    start: String,
    end: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts RFC 3339 (with offset) and naive `YYYY-MM-DDTHH:MM:SS`, which is
/// interpreted as UTC.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, JsValue> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| JsValue::from_str(&format!("Invalid datetime '{}': {}", s, e)))
}

fn parse_zone(zone: &str) -> Result<Tz, JsValue> {
    config::parse_zone(zone).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Convert a JSON array of ISO 8601 strings into slot instants.
fn parse_slots_json(json: &str) -> Result<Vec<DateTime<Utc>>, JsValue> {
    let raw: Vec<String> = serde_json::from_str(json)
        .map_err(|e| JsValue::from_str(&format!("Invalid slots JSON: {}", e)))?;
    raw.iter().map(|s| parse_datetime(s)).collect()
}

/// Convert a JSON array of `{start, end}` objects into busy intervals.
fn parse_busy_json(json: &str) -> Result<Vec<BusyInterval>, JsValue> {
    let inputs: Vec<BusyInput> = serde_json::from_str(json)
        .map_err(|e| JsValue::from_str(&format!("Invalid busy JSON: {}", e)))?;

    inputs
        .into_iter()
        .map(|input| {
            let start = parse_datetime(&input.start)?;
            let end = parse_datetime(&input.end)?;
            Ok(BusyInterval::new(start, end))
        })
        .collect()
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn slots_to_strings(slots: &[DateTime<Utc>]) -> Vec<String> {
    slots.iter().map(DateTime::to_rfc3339).collect()
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Generate slot proposals.
///
/// `config_json` is a (possibly partial) configuration object using either
/// the form's camelCase names or snake_case; out-of-range values are clamped.
/// `now` is an ISO 8601 instant defining "today". `seed` drives the random
/// source; pass a fresh random number for a new proposal.
///
/// Returns `{slots, requested, attempts, exhausted}` with RFC 3339 slots.
#[wasm_bindgen(js_name = "generateSlots")]
pub fn generate_slots(config_json: &str, now: &str, seed: u64) -> Result<String, JsValue> {
    let input: SlotConfigInput = serde_json::from_str(config_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid config JSON: {}", e)))?;
    let config = input.normalize();
    let now = parse_datetime(now)?;

    let report = slot_engine::generate_with_report(&config, now, &mut StdRng::seed_from_u64(seed));

    to_json(&GenerationDto {
        exhausted: report.is_exhausted(),
        slots: slots_to_strings(&report.slots),
        requested: report.requested,
        attempts: report.attempts,
    })
}

/// Drop slots whose 30-minute hold overlaps any busy interval.
///
/// `slots_json` is an array of ISO 8601 strings; `busy_json` an array of
/// `{start, end}` objects. Returns the remaining slots as a JSON array.
#[wasm_bindgen(js_name = "filterAvailable")]
pub fn filter_available(slots_json: &str, busy_json: &str) -> Result<String, JsValue> {
    let slots = parse_slots_json(slots_json)?;
    let busy = parse_busy_json(busy_json)?;
    to_json(&slots_to_strings(&slot_engine::filter_available(&slots, &busy)))
}

/// Extract busy intervals from the text of an `.ics` file.
#[wasm_bindgen(js_name = "parseIcs")]
pub fn parse_ics(text: &str, zone: &str) -> Result<String, JsValue> {
    let zone = parse_zone(zone)?;
    let busy = slot_engine::ics::parse_busy(text, zone)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let dtos: Vec<BusyDto> = busy.iter().map(BusyDto::from).collect();
    to_json(&dtos)
}

/// Newline-joined `• <label>` lines.
#[wasm_bindgen(js_name = "bulletList")]
pub fn bullet_list(slots_json: &str, zone: &str) -> Result<String, JsValue> {
    let slots = parse_slots_json(slots_json)?;
    Ok(render::bullet_list(&slots, parse_zone(zone)?))
}

/// Email draft; `tone` is `"warm"` or `"formal"`.
#[wasm_bindgen(js_name = "buildEmail")]
pub fn build_email(slots_json: &str, zone: &str, name: &str, tone: &str) -> Result<String, JsValue> {
    let slots = parse_slots_json(slots_json)?;
    let tone: Tone = tone.parse().map_err(|e: String| JsValue::from_str(&e))?;
    Ok(render::build_email(&slots, parse_zone(zone)?, name, tone))
}

/// iCalendar file with one 30-minute hold per slot; `stamp` is the
/// creation time written to every event.
#[wasm_bindgen(js_name = "exportIcs")]
pub fn export_ics(slots_json: &str, zone: &str, name: &str, stamp: &str) -> Result<String, JsValue> {
    let slots = parse_slots_json(slots_json)?;
    let stamp = parse_datetime(stamp)?;
    Ok(slot_engine::ics::export_calendar(&slots, parse_zone(zone)?, name, stamp))
}

/// Per-day slot counts, `[{day, count}]` in chronological order.
#[wasm_bindgen(js_name = "daySummary")]
pub fn day_summary(slots_json: &str, zone: &str) -> Result<String, JsValue> {
    let slots = parse_slots_json(slots_json)?;
    let dtos: Vec<DaySummaryDto> = slot_engine::day::partition_by_day(&slots, parse_zone(zone)?)
        .into_iter()
        .map(|(day, count)| DaySummaryDto { day, count })
        .collect();
    to_json(&dtos)
}
