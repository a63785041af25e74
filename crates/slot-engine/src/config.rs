//! Generation configuration: lenient input and the normalized config.
//!
//! [`SlotConfigInput`] mirrors what a form or a JSON file provides: every
//! field optional, numbers possibly given as text. [`SlotConfigInput::normalize`]
//! turns it into a [`SlotConfig`] by clamping every value to its valid range.
//! Normalization never fails: out-of-range values are pulled to the nearest
//! bound and unreadable values fall back to their defaults.

use std::collections::BTreeSet;
use std::fmt;

use chrono_tz::Tz;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::dst::DstPolicy;
use crate::error::{Result, SlotError};

/// Reference zone used when none is configured.
pub const DEFAULT_ZONE: Tz = chrono_tz::America::Toronto;

pub const DEFAULT_COUNT: u32 = 6;
pub const DEFAULT_MAX_DAYS_AHEAD: u32 = 21;
pub const DEFAULT_INTERVAL: u32 = 30;
pub const DEFAULT_WINDOW_START: TimeOfDay = TimeOfDay { hour: 9, minute: 30 };
pub const DEFAULT_WINDOW_END: TimeOfDay = TimeOfDay { hour: 17, minute: 30 };

pub const COUNT_RANGE: (u32, u32) = (1, 24);
pub const MAX_DAYS_AHEAD_RANGE: (u32, u32) = (1, 120);
pub const INTERVAL_RANGE: (u32, u32) = (5, 180);

/// A wall-clock time of day, always within `00:00..=23:59`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    /// Build a time of day, clamping hour to 0..=23 and minute to 0..=59
    /// independently.
    pub fn new(hour: i64, minute: i64) -> Self {
        Self {
            hour: hour.clamp(0, 23) as u32,
            minute: minute.clamp(0, 59) as u32,
        }
    }

    /// Parse `"HH:MM"`. Components are clamped, not rejected; `None` only
    /// when a component is not a number at all.
    pub fn parse(s: &str) -> Option<Self> {
        let (h, m) = s.trim().split_once(':')?;
        let hour = parse_leading_int(h)?;
        let minute = parse_leading_int(m)?;
        Some(Self::new(hour, minute))
    }

    /// Minutes since midnight.
    pub fn minutes(self) -> u32 {
        self.hour * 60 + self.minute
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Fully normalized, immutable configuration for one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotConfig {
    /// Target number of slots, 1..=24.
    pub count: u32,
    /// Candidate days are `today+1 ..= today+max_days_ahead`, 1..=120.
    pub max_days_ahead: u32,
    pub window_start: TimeOfDay,
    pub window_end: TimeOfDay,
    /// Snap grid in minutes, 5..=180.
    pub interval: u32,
    /// Maximum slots per calendar day; 0 means unlimited.
    pub per_day: u32,
    pub weekdays_only: bool,
    pub biz_friendly_padding: bool,
    pub morning_bias: bool,
    pub afternoon_bias: bool,
    /// Excluded days as `YYYY-MM-DD` in the reference zone.
    pub blacklist: BTreeSet<String>,
    /// Reference zone for day identity, weekday checks and labels.
    pub zone: Tz,
    pub dst_policy: DstPolicy,
}

impl Default for SlotConfig {
    fn default() -> Self {
        SlotConfigInput::default().normalize()
    }
}

impl SlotConfig {
    /// Open boundary of the sampling window, in minutes since midnight.
    pub fn open_minute(&self) -> u32 {
        self.window_start.minutes().min(self.window_end.minutes())
    }

    /// Close boundary of the sampling window, in minutes since midnight.
    pub fn close_minute(&self) -> u32 {
        self.window_start.minutes().max(self.window_end.minutes())
    }

    /// Re-apply every range clamp. Used by the generator so that a config
    /// assembled by hand cannot push it outside its valid domain.
    pub fn normalized(&self) -> SlotConfig {
        SlotConfig {
            count: self.count.clamp(COUNT_RANGE.0, COUNT_RANGE.1),
            max_days_ahead: self
                .max_days_ahead
                .clamp(MAX_DAYS_AHEAD_RANGE.0, MAX_DAYS_AHEAD_RANGE.1),
            window_start: TimeOfDay::new(
                i64::from(self.window_start.hour),
                i64::from(self.window_start.minute),
            ),
            window_end: TimeOfDay::new(
                i64::from(self.window_end.hour),
                i64::from(self.window_end.minute),
            ),
            interval: self.interval.clamp(INTERVAL_RANGE.0, INTERVAL_RANGE.1),
            blacklist: clean_blacklist(self.blacklist.iter().map(String::as_str)),
            ..self.clone()
        }
    }
}

/// Blacklist as provided: either a JSON list or a comma-separated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlacklistInput {
    List(Vec<String>),
    Csv(String),
}

/// An integer field as provided by a form: a number, or text that may or
/// may not start with one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LenientInt {
    Int(i64),
    Float(f64),
    Text(String),
}

impl LenientInt {
    fn value(&self) -> Option<i64> {
        match self {
            LenientInt::Int(v) => Some(*v),
            LenientInt::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            LenientInt::Float(_) => None,
            LenientInt::Text(s) => parse_leading_int(s),
        }
    }
}

impl From<i64> for LenientInt {
    fn from(v: i64) -> Self {
        LenientInt::Int(v)
    }
}

/// A checkbox-like field: a boolean, `0`/`1`, or text such as `"true"`,
/// `"on"` or `"no"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LenientBool {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl LenientBool {
    fn value(&self) -> Option<bool> {
        match self {
            LenientBool::Bool(b) => Some(*b),
            LenientBool::Int(n) => Some(*n != 0),
            LenientBool::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "1" | "checked" => Some(true),
                "false" | "off" | "no" | "0" | "" => Some(false),
                _ => None,
            },
        }
    }
}

impl From<bool> for LenientBool {
    fn from(v: bool) -> Self {
        LenientBool::Bool(v)
    }
}

/// Either a value of the expected shape or anything else, which reads as
/// absent.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Value(T),
    Other(IgnoredAny),
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Lenient::<T>::deserialize(deserializer)? {
        Lenient::Value(v) => Some(v),
        Lenient::Other(_) => None,
    })
}

/// Raw configuration, every field optional.
///
/// Field names accept both snake_case and the camelCase names used by the
/// browser form (`maxDaysAhead`, `perDay`, `bizFriendly`, ...). A field of
/// the wrong JSON type (or `null`) is treated as missing instead of failing
/// the whole input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfigInput {
    #[serde(deserialize_with = "lenient")]
    pub count: Option<LenientInt>,
    #[serde(alias = "maxDaysAhead", alias = "daysAhead", deserialize_with = "lenient")]
    pub max_days_ahead: Option<LenientInt>,
    #[serde(
        alias = "start",
        alias = "startTime",
        alias = "windowStart",
        deserialize_with = "lenient"
    )]
    pub window_start: Option<String>,
    #[serde(
        alias = "end",
        alias = "endTime",
        alias = "windowEnd",
        deserialize_with = "lenient"
    )]
    pub window_end: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub interval: Option<LenientInt>,
    #[serde(alias = "perDay", deserialize_with = "lenient")]
    pub per_day: Option<LenientInt>,
    #[serde(alias = "weekdaysOnly", deserialize_with = "lenient")]
    pub weekdays_only: Option<LenientBool>,
    #[serde(
        alias = "bizFriendly",
        alias = "bizFriendlyPadding",
        deserialize_with = "lenient"
    )]
    pub biz_friendly_padding: Option<LenientBool>,
    #[serde(alias = "morningBias", deserialize_with = "lenient")]
    pub morning_bias: Option<LenientBool>,
    #[serde(alias = "afternoonBias", deserialize_with = "lenient")]
    pub afternoon_bias: Option<LenientBool>,
    #[serde(deserialize_with = "lenient")]
    pub blacklist: Option<BlacklistInput>,
    #[serde(alias = "timeZone", alias = "timezone", deserialize_with = "lenient")]
    pub zone: Option<String>,
    #[serde(alias = "dstPolicy", deserialize_with = "lenient")]
    pub dst_policy: Option<DstPolicy>,
}

impl SlotConfigInput {
    /// Layer `overrides` on top of `self`: any field set in `overrides` wins.
    pub fn merge(self, overrides: SlotConfigInput) -> SlotConfigInput {
        SlotConfigInput {
            count: overrides.count.or(self.count),
            max_days_ahead: overrides.max_days_ahead.or(self.max_days_ahead),
            window_start: overrides.window_start.or(self.window_start),
            window_end: overrides.window_end.or(self.window_end),
            interval: overrides.interval.or(self.interval),
            per_day: overrides.per_day.or(self.per_day),
            weekdays_only: overrides.weekdays_only.or(self.weekdays_only),
            biz_friendly_padding: overrides.biz_friendly_padding.or(self.biz_friendly_padding),
            morning_bias: overrides.morning_bias.or(self.morning_bias),
            afternoon_bias: overrides.afternoon_bias.or(self.afternoon_bias),
            blacklist: overrides.blacklist.or(self.blacklist),
            zone: overrides.zone.or(self.zone),
            dst_policy: overrides.dst_policy.or(self.dst_policy),
        }
    }

    /// Clamp every field into range, substituting defaults for missing or
    /// unreadable values.
    pub fn normalize(&self) -> SlotConfig {
        let int = |field: &Option<LenientInt>| field.as_ref().and_then(LenientInt::value);
        let flag = |field: &Option<LenientBool>| {
            field.as_ref().and_then(LenientBool::value).unwrap_or(false)
        };
        let time = |field: &Option<String>, default: TimeOfDay| {
            field
                .as_deref()
                .and_then(TimeOfDay::parse)
                .unwrap_or(default)
        };

        let blacklist = match &self.blacklist {
            Some(BlacklistInput::List(days)) => clean_blacklist(days.iter().map(String::as_str)),
            Some(BlacklistInput::Csv(raw)) => parse_blacklist(raw),
            None => BTreeSet::new(),
        };

        SlotConfig {
            count: clamp_u32(int(&self.count), DEFAULT_COUNT, COUNT_RANGE),
            max_days_ahead: clamp_u32(
                int(&self.max_days_ahead),
                DEFAULT_MAX_DAYS_AHEAD,
                MAX_DAYS_AHEAD_RANGE,
            ),
            window_start: time(&self.window_start, DEFAULT_WINDOW_START),
            window_end: time(&self.window_end, DEFAULT_WINDOW_END),
            interval: clamp_u32(int(&self.interval), DEFAULT_INTERVAL, INTERVAL_RANGE),
            per_day: int(&self.per_day)
                .unwrap_or(0)
                .clamp(0, i64::from(u32::MAX)) as u32,
            weekdays_only: flag(&self.weekdays_only),
            biz_friendly_padding: flag(&self.biz_friendly_padding),
            morning_bias: flag(&self.morning_bias),
            afternoon_bias: flag(&self.afternoon_bias),
            blacklist,
            zone: self
                .zone
                .as_deref()
                .and_then(|name| name.trim().parse::<Tz>().ok())
                .unwrap_or(DEFAULT_ZONE),
            dst_policy: self.dst_policy.unwrap_or_default(),
        }
    }
}

/// Resolve an IANA zone name strictly; blank means [`DEFAULT_ZONE`].
///
/// Configuration input falls back to the default for an unknown zone; this
/// is for callers that name a zone explicitly and expect it to exist.
///
/// # Errors
/// Returns `SlotError::InvalidTimezone` if the name is not a known zone.
pub fn parse_zone(name: &str) -> Result<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(DEFAULT_ZONE);
    }
    name.parse::<Tz>()
        .map_err(|_| SlotError::InvalidTimezone(name.to_string()))
}

/// Split a comma-separated blacklist into trimmed, non-empty day keys.
pub fn parse_blacklist(raw: &str) -> BTreeSet<String> {
    clean_blacklist(raw.split(','))
}

fn clean_blacklist<'a>(days: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    days.map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

fn clamp_u32(value: Option<i64>, default: u32, (min, max): (u32, u32)) -> u32 {
    value
        .unwrap_or(i64::from(default))
        .clamp(i64::from(min), i64::from(max)) as u32
}

/// Integer prefix of `s` (after optional whitespace and sign), like a form
/// field read with `parseInt`. `"12abc"` is 12, `"abc"` is `None`.
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Saturate absurdly long digit strings; they are clamped afterwards anyway.
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}
