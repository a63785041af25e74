//! Error types for slot-engine operations.
//!
//! Generation and filtering never fail; these errors only cover the edges
//! where external data enters the engine (calendar feeds, zone names,
//! busy-interval collaborators).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Malformed calendar feed: {0}")]
    MalformedFeed(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Busy source unavailable: {0}")]
    Source(#[from] SourceError),
}

/// Why a busy-interval source could not contribute to a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("authorization unavailable: {0}")]
    Unauthorized(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("calendar service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("unreadable busy data: {0}")]
    MalformedFeed(String),

    #[error("timed out after {0} ms")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, SlotError>;
