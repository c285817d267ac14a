//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`TempoError`]
//! at the port boundary. Adapter errors cross the boundary as boxed sources
//! so the core never depends on adapter crates.

/// Top-level error for the tempo workspace.
#[derive(Debug, thiserror::Error)]
pub enum TempoError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A record was looked up but does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The record store failed (query, delete, connection).
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The publish sink failed (broker rejected or timed out).
    #[error("publish error")]
    Publish(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The automation has no target topic.
    #[error("automation path must not be empty")]
    EmptyPath,

    /// The automation has no eligible weekdays and could never fire.
    #[error("automation must have at least one weekday")]
    NoDays,

    /// A clock string did not parse as `HH:mm`.
    #[error("invalid clock time `{0}`, expected HH:mm")]
    InvalidClock(String),

    /// A timezone string is not a known IANA identifier.
    #[error("unknown timezone `{0}`")]
    UnknownTimezone(String),

    /// A weekday value is outside 1..=7.
    #[error("invalid weekday `{0}`, expected 1 (Monday) to 7 (Sunday)")]
    InvalidWeekday(String),
}

/// A lookup failed to find the requested record.
#[derive(Debug, thiserror::Error)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    /// The kind of record looked up (e.g. `"Automation"`).
    pub entity: &'static str,
    /// The identifier that missed.
    pub id: String,
}
