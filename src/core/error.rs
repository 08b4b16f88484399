//! Error types for scheduler operations.
//!
//! Business conditions (no open task, missing worker capability, stale target)
//! never surface here; they produce `None` or empty results instead.

use thiserror::Error;

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Internal consistency fault inside the dispatcher.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    /// No scheduler is registered for the requested zone.
    #[error("unknown zone: {0}")]
    UnknownZone(String),
    /// Configuration rejected during validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
