// ABOUTME: Unified error taxonomy for sync operations across all components
// ABOUTME: Distinguishes auth, transport, upstream, analysis, and quota failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Sync Error Taxonomy
//!
//! Every failure a sync cycle can hit is a variant of [`SyncError`]. The
//! orchestrator pattern-matches on variants to decide continue-vs-abort per
//! selection policy; the quota variant is load-bearing, since it is the only
//! one that trips the daily circuit breaker.

use thiserror::Error;

/// Result type alias for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Unified error type for the sync engine
#[derive(Debug, Error)]
pub enum SyncError {
    /// Neither a manual bearer token nor a full refresh-credential triple is
    /// configured. Non-retryable; the operator must supply credentials.
    #[error("authentication not configured: {0}")]
    AuthConfiguration(String),

    /// The activity source rejected the bearer token (401). The operator
    /// must re-authorize or supply a fresh token.
    #[error("access token expired or invalid: {0}")]
    AuthExpired(String),

    /// The activity source rejected the token's scope (403).
    #[error("insufficient permissions: {0}")]
    Permission(String),

    /// Network-layer failure talking to an upstream API.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// Any other non-success response from an upstream API.
    #[error("upstream error ({status}): {message}")]
    Upstream {
        /// HTTP status code returned by the upstream
        status: u16,
        /// Response body or upstream error message
        message: String,
    },

    /// The analysis endpoint returned an empty or schema-violating response.
    /// Treated as a non-transient analysis failure; the activity is skipped.
    #[error("malformed analysis response: {0}")]
    MalformedResponse(String),

    /// Transient analysis failures persisted through every backoff attempt.
    #[error("analysis failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made before giving up
        attempts: u32,
        /// Message of the final failure
        last: String,
    },

    /// The AI quota for the day is exhausted. Distinguished and
    /// non-retryable: callers match on this variant to trip the daily
    /// circuit breaker and abort the cycle.
    #[error("AI quota exhausted: {message}")]
    QuotaExhausted {
        /// Upstream quota error message
        message: String,
    },

    /// No activity matched the configured category filter when one was
    /// required (force/verify path).
    #[error("no activity matching the '{0}' filter was found")]
    NoMatchingActivity(String),

    /// Reading or writing the persisted quota state failed.
    #[error("quota state storage failure: {0}")]
    Storage(#[from] std::io::Error),

    /// Invalid or missing process configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Whether this is the distinguished quota-exhaustion condition
    #[must_use]
    pub const fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExhausted { .. })
    }

    /// Upstream error from a status code and message body
    #[must_use]
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }
}
