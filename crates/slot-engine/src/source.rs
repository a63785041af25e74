//! Busy-interval sources: imported iCalendar feeds and live FreeBusy queries.
//!
//! Every source is queried with a bounded wait. A source that fails or is too
//! slow contributes no intervals and is reported as
//! [`SourceStatus::Unavailable`]; it never aborts slot generation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::availability::{overlaps, BusyInterval};
use crate::error::{SlotError, SourceError};
use crate::ics;

/// How long a single source (including its authorization step) may take.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(4);

pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// A collaborator that can report busy time for a range.
#[async_trait]
pub trait BusySource: Send + Sync {
    /// Stable, non-sensitive name used in status messages and logs.
    fn name(&self) -> &str;

    /// Busy intervals overlapping `[start, end)`.
    async fn busy_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, SourceError>;
}

/// Outcome of querying one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Available { source: String, intervals: usize },
    Unavailable { source: String, reason: String },
}

impl SourceStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, SourceStatus::Available { .. })
    }
}

/// Busy intervals gathered from all sources, plus one status per source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusyReport {
    pub intervals: Vec<BusyInterval>,
    pub statuses: Vec<SourceStatus>,
}

/// Query each source once for `[start, end)` and concatenate the results.
///
/// Each query is bounded by `timeout`. With no sources nothing is called.
pub async fn collect_busy(
    sources: &[Box<dyn BusySource>],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    timeout: Duration,
) -> BusyReport {
    let mut report = BusyReport::default();

    for source in sources {
        let name = source.name().to_string();
        let outcome = match tokio::time::timeout(timeout, source.busy_between(start, end)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(timeout.as_millis() as u64)),
        };

        match outcome {
            Ok(intervals) => {
                debug!(source = %name, intervals = intervals.len(), "busy_source_loaded");
                report.statuses.push(SourceStatus::Available {
                    source: name,
                    intervals: intervals.len(),
                });
                report.intervals.extend(intervals);
            }
            Err(err) => {
                warn!(source = %name, reason = %err, "busy_source_unavailable");
                report.statuses.push(SourceStatus::Unavailable {
                    source: name,
                    reason: err.to_string(),
                });
            }
        }
    }

    report
}

fn within(intervals: &[BusyInterval], start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<BusyInterval> {
    intervals
        .iter()
        .filter(|b| overlaps(b.start, b.end, start, end))
        .copied()
        .collect()
}

// ---------------------------------------------------------------------------
// In-memory source
// ---------------------------------------------------------------------------

/// Busy intervals already in memory (handed over by a host page, or tests).
#[derive(Debug, Clone)]
pub struct StaticBusy {
    name: String,
    intervals: Vec<BusyInterval>,
}

impl StaticBusy {
    pub fn new(name: impl Into<String>, intervals: Vec<BusyInterval>) -> Self {
        Self {
            name: name.into(),
            intervals,
        }
    }
}

#[async_trait]
impl BusySource for StaticBusy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn busy_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, SourceError> {
        Ok(within(&self.intervals, start, end))
    }
}

// ---------------------------------------------------------------------------
// Imported iCalendar feed
// ---------------------------------------------------------------------------

/// Busy time imported from an `.ics` file (iCloud, Outlook, any exporter).
///
/// The feed is parsed once at construction; a feed that could not be read or
/// parsed stays unavailable for every query.
#[derive(Debug, Clone)]
pub struct IcsFeed {
    name: String,
    parsed: Result<Vec<BusyInterval>, SourceError>,
}

impl IcsFeed {
    /// Parse feed text; floating times are read in `zone`.
    pub fn from_text(name: impl Into<String>, text: &str, zone: Tz) -> Self {
        let parsed = ics::parse_busy(text, zone).map_err(|err| match err {
            SlotError::Source(inner) => inner,
            other => SourceError::MalformedFeed(other.to_string()),
        });
        Self {
            name: name.into(),
            parsed,
        }
    }

    /// Read and parse a feed file. The file name is the source name.
    pub fn from_path(path: &Path, zone: Tz) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_text(name, &text, zone),
            Err(err) => Self {
                name,
                parsed: Err(SourceError::MalformedFeed(format!("cannot read feed: {err}"))),
            },
        }
    }

    /// Number of busy intervals loaded, `None` if the feed is unavailable.
    pub fn loaded(&self) -> Option<usize> {
        self.parsed.as_ref().ok().map(Vec::len)
    }
}

#[async_trait]
impl BusySource for IcsFeed {
    fn name(&self) -> &str {
        &self.name
    }

    async fn busy_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, SourceError> {
        match &self.parsed {
            Ok(intervals) => Ok(within(intervals, start, end)),
            Err(err) => Err(err.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Live FreeBusy query
// ---------------------------------------------------------------------------

/// Supplies a bearer token for a live calendar query.
///
/// Obtaining the token may involve an interactive consent step; the caller
/// bounds the wait, so implementations may simply await it.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, SourceError>;
}

/// A token obtained out of band.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, SourceError> {
        if self.0.trim().is_empty() {
            return Err(SourceError::Unauthorized("no access token".to_string()));
        }
        Ok(self.0.clone())
    }
}

/// Client for a Google Calendar compatible `freeBusy` endpoint.
pub struct FreeBusyClient {
    client: reqwest::Client,
    base_url: String,
    calendar_id: String,
    tokens: Arc<dyn AccessTokenProvider>,
    auth_timeout: Duration,
}

impl FreeBusyClient {
    /// Query `calendar_id` (usually `"primary"`) at the public Google endpoint.
    pub fn new(calendar_id: impl Into<String>, tokens: Arc<dyn AccessTokenProvider>) -> Self {
        Self::with_base_url(GOOGLE_CALENDAR_API_BASE, calendar_id, tokens)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        calendar_id: impl Into<String>,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            calendar_id: calendar_id.into(),
            tokens,
            auth_timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    /// Bound the wait for the token provider.
    pub fn auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    async fn token(&self) -> Result<String, SourceError> {
        match tokio::time::timeout(self.auth_timeout, self.tokens.access_token()).await {
            Ok(token) => token,
            Err(_) => Err(SourceError::Unauthorized(
                "sign-in was not completed in time".to_string(),
            )),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FreeBusyRequest<'a> {
    time_min: String,
    time_max: String,
    items: [FreeBusyItem<'a>; 1],
}

#[derive(Serialize)]
struct FreeBusyItem<'a> {
    id: &'a str,
}

#[derive(Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, CalendarBusy>,
}

#[derive(Deserialize)]
struct CalendarBusy {
    #[serde(default)]
    busy: Vec<BusyPeriod>,
    #[serde(default)]
    errors: Vec<CalendarError>,
}

#[derive(Deserialize)]
struct BusyPeriod {
    start: String,
    end: String,
}

#[derive(Deserialize)]
struct CalendarError {
    #[serde(default)]
    reason: String,
}

#[async_trait]
impl BusySource for FreeBusyClient {
    fn name(&self) -> &str {
        "google-freebusy"
    }

    async fn busy_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, SourceError> {
        let token = self.token().await?;

        let body = FreeBusyRequest {
            time_min: start.to_rfc3339_opts(SecondsFormat::Secs, true),
            time_max: end.to_rfc3339_opts(SecondsFormat::Secs, true),
            items: [FreeBusyItem {
                id: &self.calendar_id,
            }],
        };

        let response = self
            .client
            .post(format!("{}/freeBusy", self.base_url))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(SourceError::Unauthorized(format!(
                "calendar service rejected the token (HTTP {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SourceError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: FreeBusyResponse = response
            .json()
            .await
            .map_err(|e| SourceError::MalformedFeed(format!("FreeBusy response: {e}")))?;

        let calendar = parsed.calendars.get(&self.calendar_id).ok_or_else(|| {
            SourceError::MalformedFeed(format!("no entry for calendar '{}'", self.calendar_id))
        })?;

        if let Some(error) = calendar.errors.first() {
            return Err(SourceError::Unauthorized(format!(
                "calendar '{}' not readable: {}",
                self.calendar_id, error.reason
            )));
        }

        calendar
            .busy
            .iter()
            .map(|period| {
                let start = parse_rfc3339(&period.start)?;
                let end = parse_rfc3339(&period.end)?;
                Ok(BusyInterval::new(start, end))
            })
            .collect()
    }
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, SourceError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SourceError::MalformedFeed(format!("invalid busy time '{value}': {e}")))
}
