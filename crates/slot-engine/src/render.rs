//! Human-readable rendering: slot labels, bullet lists and email drafts.
//!
//! Everything is rendered in the reference zone, never the viewer's zone.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Signer used when none (or a blank one) is given.
pub const DEFAULT_SIGNER: &str = "Candidate";

/// Short generic label for a zone: `ET`, `CT`, `MT`, `PT` for the North
/// American zones, otherwise the zone's abbreviation at `instant`.
pub fn zone_label(zone: Tz, instant: DateTime<Utc>) -> String {
    let generic = match zone.name() {
        "America/Toronto" | "America/New_York" | "America/Detroit" | "America/Montreal"
        | "America/Nassau" | "US/Eastern" | "Canada/Eastern" | "EST5EDT" => Some("ET"),
        "America/Chicago" | "America/Winnipeg" | "US/Central" | "Canada/Central"
        | "CST6CDT" => Some("CT"),
        "America/Denver" | "America/Edmonton" | "US/Mountain" | "Canada/Mountain"
        | "MST7MDT" => Some("MT"),
        "America/Los_Angeles" | "America/Vancouver" | "US/Pacific" | "Canada/Pacific"
        | "PST8PDT" => Some("PT"),
        _ => None,
    };
    match generic {
        Some(label) => label.to_string(),
        None => instant.with_timezone(&zone).format("%Z").to_string(),
    }
}

/// `Tue, Oct 20, 2026 — 9:30 AM ET`
pub fn label(instant: DateTime<Utc>, zone: Tz) -> String {
    let local = instant.with_timezone(&zone);
    format!(
        "{} — {} {}",
        local.format("%a, %b %-d, %Y"),
        local.format("%-I:%M %p"),
        zone_label(zone, instant)
    )
}

/// Compact badge: `2026-10-20 09:30 AM ET`
pub fn badge(instant: DateTime<Utc>, zone: Tz) -> String {
    let local = instant.with_timezone(&zone);
    format!("{} {}", local.format("%Y-%m-%d %I:%M %p"), zone_label(zone, instant))
}

/// One `• <label>` line per slot.
pub fn bullet_lines(slots: &[DateTime<Utc>], zone: Tz) -> Vec<String> {
    slots.iter().map(|s| format!("• {}", label(*s, zone))).collect()
}

/// Bullet lines joined with newlines, ready to paste.
pub fn bullet_list(slots: &[DateTime<Utc>], zone: Tz) -> String {
    bullet_lines(slots, zone).join("\n")
}

/// Register of the email draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Warm,
    #[default]
    Formal,
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warm" => Ok(Tone::Warm),
            "formal" => Ok(Tone::Formal),
            other => Err(format!("unknown tone '{other}' (expected warm or formal)")),
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tone::Warm => "warm",
            Tone::Formal => "formal",
        })
    }
}

/// The signer to print: trimmed, or [`DEFAULT_SIGNER`] when blank.
pub fn signer_or_default(signer: &str) -> &str {
    let trimmed = signer.trim();
    if trimmed.is_empty() {
        DEFAULT_SIGNER
    } else {
        trimmed
    }
}

/// Email body proposing `slots`, signed by `signer`.
pub fn build_email(slots: &[DateTime<Utc>], zone: Tz, signer: &str, tone: Tone) -> String {
    let bullets = bullet_list(slots, zone);
    let signer = signer_or_default(signer);
    let zone = zone.name();
    match tone {
        Tone::Warm => format!(
            "Hi there!\n\n\
             Here are a few interview times that work for me ({zone}):\n\n\
             {bullets}\n\n\
             If none of these work, I'm happy to suggest alternatives.\n\n\
             Thanks so much,\n{signer}"
        ),
        Tone::Formal => format!(
            "Hello,\n\n\
             Please find a few interview times that work for me ({zone}):\n\n\
             {bullets}\n\n\
             If none of these are suitable, I can propose alternatives.\n\n\
             Kind regards,\n{signer}"
        ),
    }
}
