//! Native tests for the JSON exports.
//!
//! Only success paths are exercised here: error values are `JsValue`s, which
//! need a JavaScript host.

use serde_json::Value;
use slot_engine_wasm::{
    build_email, bullet_list, day_summary, export_ics, filter_available, generate_slots, parse_ics,
};

const NOW: &str = "2026-10-16T16:00:00Z";
const ZONE: &str = "America/Toronto";

fn json(s: &str) -> Value {
    serde_json::from_str(s).expect("export must return JSON")
}

fn slots_of(generated: &Value) -> String {
    generated["slots"].to_string()
}

#[test]
fn seeded_generation_is_reproducible() {
    let a = generate_slots(r#"{"count": 5}"#, NOW, 7).unwrap();
    let b = generate_slots(r#"{"count": 5}"#, NOW, 7).unwrap();
    assert_eq!(a, b);

    let doc = json(&a);
    assert_eq!(doc["requested"], 5);
    assert_eq!(doc["slots"].as_array().unwrap().len(), 5);
    assert_eq!(doc["exhausted"], false);
}

#[test]
fn form_shaped_config_is_accepted() {
    let doc = json(
        &generate_slots(
            r#"{"count": "3", "weekdaysOnly": "true", "start": 9, "timeZone": null}"#,
            NOW,
            1,
        )
        .unwrap(),
    );
    assert_eq!(doc["slots"].as_array().unwrap().len(), 3);
}

#[test]
fn impossible_constraints_report_exhaustion() {
    let doc = json(
        &generate_slots(r#"{"daysAhead": 2, "weekdaysOnly": true}"#, NOW, 3).unwrap(),
    );
    assert!(doc["slots"].as_array().unwrap().is_empty());
    assert_eq!(doc["exhausted"], true);
}

#[test]
fn busy_time_filters_generated_slots() {
    let generated = json(&generate_slots(r#"{"count": 4}"#, NOW, 11).unwrap());
    let first = generated["slots"][0].as_str().unwrap().to_string();
    let hold_end = chrono::DateTime::parse_from_rfc3339(&first).unwrap() + chrono::Duration::minutes(30);
    let busy = format!(r#"[{{"start": "{first}", "end": "{}"}}]"#, hold_end.to_rfc3339());

    let remaining = json(&filter_available(&slots_of(&generated), &busy).unwrap());
    let remaining = remaining.as_array().unwrap();
    assert_eq!(remaining.len(), 3);
    assert!(!remaining.iter().any(|s| s.as_str() == Some(first.as_str())));
}

#[test]
fn renderers_accept_generated_slots() {
    let generated = json(&generate_slots(r#"{"count": 2}"#, NOW, 5).unwrap());
    let slots = slots_of(&generated);

    assert_eq!(bullet_list(&slots, ZONE).unwrap().lines().count(), 2);
    assert!(build_email(&slots, "", "Sam", "warm").unwrap().ends_with("Sam"));

    let ics = export_ics(&slots, ZONE, "Sam", NOW).unwrap();
    assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);

    let days = json(&day_summary(&slots, ZONE).unwrap());
    let total: u64 = days
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["count"].as_u64().unwrap())
        .sum();
    assert_eq!(total, 2);
}

#[test]
fn ics_text_parses_to_busy_json() {
    let text = "\u{feff}BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nDTSTART:20261020T130000Z\r\n\
                DTEND:20261020T140000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
    let busy = json(&parse_ics(text, ZONE).unwrap());
    assert_eq!(busy[0]["start"], "2026-10-20T13:00:00+00:00");
    assert_eq!(busy[0]["end"], "2026-10-20T14:00:00+00:00");
}
