//! Slot generator -- bounded rejection sampling of candidate interview slots.
//!
//! Each attempt samples a day offset and a minute of day, runs them through
//! the weekday/blacklist rules and the sampling window, snaps the result to
//! the interval grid and keeps it if the per-day quota allows. Attempts are
//! capped at [`MAX_ATTEMPTS`], so tight constraints yield a short (possibly
//! empty) result rather than an error or a hang.
//!
//! The blacklist and weekday rules are evaluated on the sampled day. The
//! quota is evaluated on the day of the final snapped instant, which can be
//! the following day when padding pushes a late window past midnight. Such
//! a slot is kept without re-checking the blacklist or weekday rule.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use rand::Rng;
use tracing::debug;

use crate::config::SlotConfig;
use crate::day::{date_key, day_key, is_weekend, local_date};
use crate::dst::{self, DstPolicy};
use crate::window::SamplingWindow;

/// Maximum sampling attempts per run.
pub const MAX_ATTEMPTS: u32 = 6000;

/// Outcome of one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// Unique slots, ascending.
    pub slots: Vec<DateTime<Utc>>,
    /// The (normalized) number of slots asked for.
    pub requested: usize,
    /// Attempts consumed, at most [`MAX_ATTEMPTS`].
    pub attempts: u32,
}

impl GenerationReport {
    /// True when the constraints left fewer valid slots than requested.
    pub fn is_exhausted(&self) -> bool {
        self.slots.len() < self.requested
    }
}

/// Generate up to `config.count` unique slots after the day of `now`.
///
/// `now` defines "today" in the config's reference zone. Randomness comes
/// only from `rng`, so a seeded generator makes a run reproducible.
pub fn generate<R: Rng + ?Sized>(
    config: &SlotConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<DateTime<Utc>> {
    generate_with_report(config, now, rng).slots
}

/// Same as [`generate`], also reporting how many attempts were used.
pub fn generate_with_report<R: Rng + ?Sized>(
    config: &SlotConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> GenerationReport {
    let config = config.normalized();
    let zone = config.zone;
    let window = SamplingWindow::from_config(&config);
    let today = local_date(now, zone);
    let requested = config.count as usize;

    // Keyed by minutes since the Unix epoch: attempts landing on the same
    // minute collapse, and iteration order is chronological.
    let mut chosen: BTreeSet<i64> = BTreeSet::new();
    let mut per_day: HashMap<String, u32> = HashMap::new();
    let mut attempts = 0;

    while chosen.len() < requested && attempts < MAX_ATTEMPTS {
        attempts += 1;

        let offset = rng.gen_range(1..=config.max_days_ahead.max(1));
        let Some(day) = today.checked_add_days(Days::new(u64::from(offset))) else {
            continue;
        };
        if config.weekdays_only && is_weekend(day) {
            continue;
        }
        if config.blacklist.contains(&date_key(day)) {
            continue;
        }

        let minute = window.apply(rng.gen_range(window.open..=window.close));
        let Some(instant) = slot_instant(day, minute, config.interval, zone, config.dst_policy)
        else {
            continue;
        };

        let key = day_key(instant, zone);
        let used = per_day.get(&key).copied().unwrap_or(0);
        if config.per_day > 0 && used >= config.per_day {
            continue;
        }

        if chosen.insert(instant.timestamp().div_euclid(60)) {
            per_day.insert(key, used + 1);
        }
    }

    let slots: Vec<DateTime<Utc>> = chosen
        .into_iter()
        .filter_map(|minute| DateTime::from_timestamp(minute * 60, 0))
        .collect();

    debug!(
        requested,
        produced = slots.len(),
        attempts,
        "slot_generation_finished"
    );

    GenerationReport {
        slots,
        requested,
        attempts,
    }
}

/// Wall time `minute` minutes after midnight of `day` (rolling into the next
/// day past 23:59), minute-of-hour snapped down to the interval grid, then
/// resolved in `zone`.
fn slot_instant(
    day: NaiveDate,
    minute: i64,
    interval: u32,
    zone: Tz,
    policy: DstPolicy,
) -> Option<DateTime<Utc>> {
    let wall = NaiveDateTime::new(day, NaiveTime::MIN) + Duration::minutes(minute);
    dst::localize(zone, snap(wall, interval), policy)
}

/// Truncate the minute-of-hour to a multiple of `interval` and zero seconds.
///
/// Intervals of an hour or more always snap to the top of the hour.
pub fn snap(wall: NaiveDateTime, interval: u32) -> NaiveDateTime {
    let interval = interval.max(1);
    let minute = wall.minute() / interval * interval;
    wall.with_minute(minute)
        .and_then(|w| w.with_second(0))
        .and_then(|w| w.with_nanosecond(0))
        .unwrap_or(wall)
}
