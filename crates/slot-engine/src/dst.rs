//! DST transition policies for wall-clock slot times.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Policy for slot wall times that fall into a DST transition.
///
/// Ambiguous wall times (the repeated hour when clocks fall back) always
/// resolve to the earlier of the two instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Drop wall times that fall in the gap (e.g., 2:30 AM during spring forward).
    Skip,
    /// Move wall times in the gap forward by the size of the gap, as a
    /// browser `Date` does.
    #[default]
    ShiftForward,
}

/// Resolve a local wall time in `zone` to an absolute instant.
///
/// Returns `None` only when the wall time does not exist and the policy is
/// [`DstPolicy::Skip`].
pub fn localize(zone: Tz, local: NaiveDateTime, policy: DstPolicy) -> Option<DateTime<Utc>> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => match policy {
            DstPolicy::Skip => None,
            DstPolicy::ShiftForward => shift_past_gap(zone, local),
        },
    }
}

/// Interpret the nonexistent wall time with the offset in force just before
/// the gap, which lands the same distance past the end of the gap.
fn shift_past_gap(zone: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    // Gaps are at most a few hours; probing back a day always clears one.
    let before = local - Duration::hours(24);
    let offset = match zone.from_local_datetime(&before) {
        LocalResult::Single(dt) => dt.offset().fix(),
        LocalResult::Ambiguous(earliest, _) => earliest.offset().fix(),
        LocalResult::None => return None,
    };
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn wall(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn regular_wall_time_is_single() {
        let zone = chrono_tz::America::Toronto;
        let got = localize(zone, wall(2026, 6, 1, 9, 30), DstPolicy::Skip).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2026, 6, 1, 13, 30, 0).unwrap());
    }

    #[test]
    fn spring_forward_gap_shifts_forward() {
        // 2026-03-08 02:30 does not exist in Toronto; EST offset puts it at 03:30 EDT.
        let zone = chrono_tz::America::Toronto;
        let got = localize(zone, wall(2026, 3, 8, 2, 30), DstPolicy::ShiftForward).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2026, 3, 8, 7, 30, 0).unwrap());
    }

    #[test]
    fn spring_forward_gap_skipped() {
        let zone = chrono_tz::America::Toronto;
        assert!(localize(zone, wall(2026, 3, 8, 2, 30), DstPolicy::Skip).is_none());
    }

    #[test]
    fn fall_back_resolves_to_earliest() {
        // 2026-11-01 01:30 happens twice in Toronto; the EDT one comes first.
        let zone = chrono_tz::America::Toronto;
        let got = localize(zone, wall(2026, 11, 1, 1, 30), DstPolicy::Skip).unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2026, 11, 1, 5, 30, 0).unwrap());
    }
}
