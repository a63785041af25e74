//! One "Generate" action: sample slots, then drop those that collide with
//! busy time from the enabled sources.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::availability::{filter_available, find_conflicts, query_range, SlotConflict};
use crate::config::SlotConfig;
use crate::generator::generate_with_report;
use crate::source::{collect_busy, BusySource, SourceStatus};

/// Result of a full run, with everything the presentation layer reports.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    /// Final slots, ascending.
    pub slots: Vec<DateTime<Utc>>,
    /// Number of slots asked for.
    pub requested: usize,
    /// Slots produced by the generator before filtering.
    pub generated: usize,
    /// One entry per queried source; empty when no source was queried.
    pub sources: Vec<SourceStatus>,
    /// Why each removed slot was dropped, one entry per colliding busy interval.
    pub conflicts: Vec<SlotConflict>,
}

impl Proposal {
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots dropped because of busy time.
    pub fn removed(&self) -> usize {
        self.generated - self.slots.len()
    }

    /// Whether busy filtering actually ran against at least one source.
    pub fn was_filtered(&self) -> bool {
        self.sources.iter().any(SourceStatus::is_available)
    }

    /// Headline status for the run.
    pub fn status_message(&self) -> String {
        match self.slots.len() {
            0 => "No slots — loosen the settings".to_string(),
            1 => "Generated 1 slot".to_string(),
            n => format!("Generated {n} slots"),
        }
    }

    /// One line per source outcome, then the filter summary if filtering ran.
    pub fn source_messages(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .sources
            .iter()
            .map(|status| match status {
                SourceStatus::Available { source, intervals } => {
                    format!("{source}: {intervals} busy intervals")
                }
                SourceStatus::Unavailable { source, reason } => {
                    format!("{source} unavailable: {reason}")
                }
            })
            .collect();
        if self.was_filtered() {
            lines.push(format!("Filtered to {} free slots", self.slots.len()));
        }
        lines
    }
}

/// Generate slots for `config` and filter them against `sources`.
///
/// Sources are only queried when there is at least one slot and at least
/// one source; the query covers the first slot through the end of the last
/// slot's hold. Unavailable sources are reported and otherwise ignored.
pub async fn propose<R: Rng + ?Sized>(
    config: &SlotConfig,
    now: DateTime<Utc>,
    rng: &mut R,
    sources: &[Box<dyn BusySource>],
    timeout: Duration,
) -> Proposal {
    let report = generate_with_report(config, now, rng);
    let generated = report.slots.len();

    let (slots, statuses, conflicts) = match query_range(&report.slots) {
        Some((start, end)) if !sources.is_empty() => {
            let busy = collect_busy(sources, start, end, timeout).await;
            (
                filter_available(&report.slots, &busy.intervals),
                busy.statuses,
                find_conflicts(&report.slots, &busy.intervals),
            )
        }
        _ => (report.slots, Vec::new(), Vec::new()),
    };

    Proposal {
        slots,
        requested: report.requested,
        generated,
        sources: statuses,
        conflicts,
    }
}
