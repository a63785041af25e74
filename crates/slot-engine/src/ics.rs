//! iCalendar (RFC 5545) export of proposed slots and import of busy time.
//!
//! Export writes one 30-minute `VEVENT` per slot with UTC timestamps, so the
//! file means the same thing in every calendar client. Import is deliberately
//! narrow: it only reads `DTSTART`/`DTEND` of `VEVENT` blocks, which is all
//! the availability filter needs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::availability::{hold_end, BusyInterval};
use crate::dst::{self, DstPolicy};
use crate::error::{Result, SlotError};
use crate::render::{label, signer_or_default};

pub const PRODID: &str = "-//Availability Generator//EN";
pub const UID_DOMAIN: &str = "availability.local";

/// RFC 5545 §3.1: lines SHOULD NOT exceed 75 octets, excluding the CRLF.
const MAX_LINE_OCTETS: usize = 75;

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Render `slots` as a `VCALENDAR` of 30-minute hold events.
///
/// `stamp` becomes every event's `DTSTAMP`; pass the current time. UIDs are
/// `<start epoch millis>-<index>@availability.local`, stable for a given list.
pub fn export_calendar(
    slots: &[DateTime<Utc>],
    zone: Tz,
    signer: &str,
    stamp: DateTime<Utc>,
) -> String {
    let signer = escape_text(signer_or_default(signer));
    let stamp = utc_stamp(stamp);

    let mut lines: Vec<String> = vec![
        "BEGIN:VCALENDAR".into(),
        "VERSION:2.0".into(),
        format!("PRODID:{PRODID}"),
        "CALSCALE:GREGORIAN".into(),
        "METHOD:PUBLISH".into(),
    ];

    for (index, slot) in slots.iter().enumerate() {
        lines.push("BEGIN:VEVENT".into());
        lines.push(format!(
            "UID:{}-{}@{}",
            slot.timestamp_millis(),
            index,
            UID_DOMAIN
        ));
        lines.push(format!("DTSTAMP:{stamp}"));
        lines.push(format!("DTSTART:{}", utc_stamp(*slot)));
        lines.push(format!("DTEND:{}", utc_stamp(hold_end(*slot))));
        lines.push(format!("SUMMARY:Interview availability hold — {signer}"));
        lines.push(format!("DESCRIPTION:{}", escape_text(&label(*slot, zone))));
        lines.push("END:VEVENT".into());
    }

    lines.push("END:VCALENDAR".into());

    let mut out = String::new();
    for line in &lines {
        out.push_str(&fold_line(line));
        out.push_str("\r\n");
    }
    out
}

/// UTC basic format: `20261020T133000Z`.
pub fn utc_stamp(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Escape a TEXT value (RFC 5545 §3.3.11).
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Fold a content line at 75 octets without splitting a UTF-8 sequence.
/// Continuation lines start with a single space.
fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut used = 0;
    for c in line.chars() {
        let width = c.len_utf8();
        if used + width > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            // The leading space counts toward the next line's budget.
            used = 1;
        }
        out.push(c);
        used += width;
    }
    out
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// A `DTSTART`/`DTEND` property: raw value plus its `TZID` parameter.
#[derive(Debug, Default)]
struct DateProp {
    value: String,
    tzid: Option<String>,
}

#[derive(Debug, Default)]
struct PendingEvent {
    start: Option<DateProp>,
    end: Option<DateProp>,
}

/// Extract busy intervals from an iCalendar feed.
///
/// Timestamps ending in `Z` are UTC. Floating local timestamps and all-day
/// dates are read in the property's `TZID` zone when it is a known zone,
/// otherwise in `zone`. Events with unreadable or inverted times are skipped.
///
/// # Errors
/// Returns `SlotError::MalformedFeed` if the text is not a `VCALENDAR`.
pub fn parse_busy(text: &str, zone: Tz) -> Result<Vec<BusyInterval>> {
    // Windows exporters often prepend a UTF-8 byte order mark.
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines = unfold(text);
    if !lines.iter().any(|l| l.trim() == "BEGIN:VCALENDAR") {
        return Err(SlotError::MalformedFeed(
            "missing BEGIN:VCALENDAR".to_string(),
        ));
    }

    let mut intervals = Vec::new();
    let mut current: Option<PendingEvent> = None;

    for raw in &lines {
        let line = raw.trim();
        if line == "BEGIN:VEVENT" {
            current = Some(PendingEvent::default());
        } else if line == "END:VEVENT" {
            if let Some(event) = current.take() {
                if let Some(interval) = resolve_event(event, zone) {
                    intervals.push(interval);
                }
            }
        } else if let Some(event) = current.as_mut() {
            let Some((name_part, value)) = line.split_once(':') else {
                continue;
            };
            let mut params = name_part.split(';');
            let name = params.next().unwrap_or_default();
            let tzid = params
                .filter_map(|p| p.split_once('='))
                .find(|(k, _)| k.eq_ignore_ascii_case("TZID"))
                .map(|(_, v)| v.trim_matches('"').to_string());
            let prop = DateProp {
                value: value.to_string(),
                tzid,
            };
            match name {
                "DTSTART" => event.start = Some(prop),
                "DTEND" => event.end = Some(prop),
                _ => {}
            }
        }
    }

    debug!(count = intervals.len(), "ics_busy_parsed");
    Ok(intervals)
}

/// Normalize line endings and join folded continuation lines.
fn unfold(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<String> = Vec::new();
    for line in normalized.split('\n') {
        match (line.strip_prefix([' ', '\t']), lines.last_mut()) {
            (Some(rest), Some(previous)) => previous.push_str(rest),
            _ => lines.push(line.to_string()),
        }
    }
    lines
}

fn resolve_event(event: PendingEvent, zone: Tz) -> Option<BusyInterval> {
    let (Some(start), Some(end)) = (event.start, event.end) else {
        debug!("ics_event_skipped_missing_bounds");
        return None;
    };
    let (Some(s), Some(e)) = (
        parse_date_value(&start.value, prop_zone(&start, zone)),
        parse_date_value(&end.value, prop_zone(&end, zone)),
    ) else {
        debug!(
            start = %start.value,
            end = %end.value,
            "ics_event_skipped_unreadable_time"
        );
        return None;
    };
    if e < s {
        debug!(start = %start.value, end = %end.value, "ics_event_skipped_inverted");
        return None;
    }
    Some(BusyInterval::new(s, e))
}

fn prop_zone(prop: &DateProp, fallback: Tz) -> Tz {
    prop.tzid
        .as_deref()
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(fallback)
}

/// Parse `YYYYMMDDTHHMMSS[Z]`, `YYYYMMDDTHHMM[Z]` or `YYYYMMDD`.
fn parse_date_value(value: &str, zone: Tz) -> Option<DateTime<Utc>> {
    let v = value.trim();

    if let Some(utc) = v.strip_suffix('Z') {
        return parse_basic_datetime(utc).map(|ndt| ndt.and_utc());
    }
    if v.contains('T') {
        let local = parse_basic_datetime(v)?;
        return dst::localize(zone, local, DstPolicy::ShiftForward);
    }
    let date = NaiveDate::parse_from_str(v, "%Y%m%d").ok()?;
    dst::localize(
        zone,
        NaiveDateTime::new(date, NaiveTime::MIN),
        DstPolicy::ShiftForward,
    )
}

fn parse_basic_datetime(v: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(v, "%Y%m%dT%H%M%S")
        .or_else(|_| NaiveDateTime::parse_from_str(v, "%Y%m%dT%H%M"))
        .ok()
}
