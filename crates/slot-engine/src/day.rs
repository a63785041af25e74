//! Calendar-day identity in the reference zone.
//!
//! Every per-day rule (blacklist, per-day quota, weekday filter, day summary)
//! goes through [`day_key`] / [`local_date`] so the call sites cannot drift.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;

/// `YYYY-MM-DD` of `instant` as seen in `zone`.
pub fn day_key(instant: DateTime<Utc>, zone: Tz) -> String {
    date_key(local_date(instant, zone))
}

/// `YYYY-MM-DD` of a calendar date.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// The calendar date of `instant` in `zone`.
pub fn local_date(instant: DateTime<Utc>, zone: Tz) -> NaiveDate {
    instant.with_timezone(&zone).date_naive()
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Group slots by day key, preserving first-seen day order.
///
/// For a sorted slot list this yields days in chronological order, each with
/// the number of slots that landed on it.
pub fn partition_by_day(slots: &[DateTime<Utc>], zone: Tz) -> Vec<(String, usize)> {
    let mut days: Vec<(String, usize)> = Vec::new();
    for slot in slots {
        let key = day_key(*slot, zone);
        match days.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => days.push((key, 1)),
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn key_uses_reference_zone_not_utc() {
        // 02:00 UTC on the 21st is still the evening of the 20th in Toronto.
        let instant = Utc.with_ymd_and_hms(2026, 10, 21, 2, 0, 0).unwrap();
        assert_eq!(day_key(instant, chrono_tz::America::Toronto), "2026-10-20");
        assert_eq!(day_key(instant, chrono_tz::UTC), "2026-10-21");
    }

    #[test]
    fn weekend_detection() {
        assert!(is_weekend(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()));
        assert!(is_weekend(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()));
        assert!(!is_weekend(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()));
    }
}
