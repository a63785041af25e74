//! # slot-engine
//!
//! Randomized, policy-constrained interview slot proposals.
//!
//! The engine samples candidate slots under a set of interacting constraints
//! (day range, time window, weekday and blacklist rules, padding, bias,
//! per-day quota), snaps them to an interval grid in a fixed reference zone,
//! and optionally drops the ones that collide with busy time pulled from
//! calendar sources. Results can be rendered as a bullet list, an email draft
//! or an iCalendar file.
//!
//! ## Modules
//!
//! - [`config`] — Lenient input and the normalized [`SlotConfig`]
//! - [`generator`] — Bounded rejection sampling of slots
//! - [`window`] — Padding and morning/afternoon bias of the sampling window
//! - [`availability`] — Busy-interval overlap filter
//! - [`day`] — Day identity in the reference zone
//! - [`dst`] — DST gap/overlap policies
//! - [`render`] — Labels, bullet lists, email drafts
//! - [`ics`] — iCalendar export and busy-time import
//! - [`source`] — Async busy sources with bounded waits (feature `sources`)
//! - [`pipeline`] — Generate + filter in one call (feature `sources`)
//! - [`error`] — Error types

pub mod availability;
pub mod config;
pub mod day;
pub mod dst;
pub mod error;
pub mod generator;
pub mod ics;
pub mod render;
pub mod window;

#[cfg(feature = "sources")]
pub mod pipeline;
#[cfg(feature = "sources")]
pub mod source;

pub use availability::{filter_available, find_conflicts, BusyInterval, HOLD_MINUTES};
pub use config::{SlotConfig, SlotConfigInput, TimeOfDay};
pub use day::day_key;
pub use error::{SlotError, SourceError};
pub use generator::{generate, generate_with_report, GenerationReport};
pub use render::Tone;

#[cfg(feature = "sources")]
pub use pipeline::{propose, Proposal};
#[cfg(feature = "sources")]
pub use source::{collect_busy, BusySource, SourceStatus};
